//! Main CLI application

use crate::config::load_task_sets;
use crate::error::{exit_code, SlapError};
use crate::runner::{ErrorEvent, Event, Reporter, Runner, TaskSets, DEFAULT_TASK_SET};
use crate::tasks::TaskRegistry;
use crate::ui::{self, ConsoleReporter, Verbosity};
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use std::ffi::OsString;
use std::path::PathBuf;

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("slap")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run task sets defined in a slap.yml file")
        .arg(
            Arg::new("task-sets")
                .value_name("TASK_SET")
                .help("Task sets to run, in order (default: 'default')")
                .num_args(0..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to the task-sets file (default: search for slap.yml upwards)"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List task sets instead of running them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("all")
                .short('a')
                .long("all")
                .help("With --list, include task sets without a description")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print echoed messages and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Render the task-set listing
///
/// Task sets without a description are only shown with `all`.
pub fn list_task_sets(task_sets: &TaskSets, all: bool) -> String {
    let shown: Vec<_> = task_sets
        .iter()
        .filter(|(_, set)| all || set.description().is_some())
        .collect();
    let width = shown.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (name, set) in shown {
        let mut line = format!("{:width$}", name, width = width);
        let deps = set.deps();
        if !deps.is_empty() {
            line.push_str(&format!("  [deps: {}]", deps.join(", ")));
        }
        if let Some(description) = set.description() {
            line.push_str("  ");
            line.push_str(description);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Run the CLI with the process arguments, returning the exit code
pub fn run() -> i32 {
    run_from(std::env::args_os())
}

/// Run the CLI with provided arguments, returning the exit code
pub fn run_from<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);

    if matches.get_flag("no-color") {
        ui::set_color(false);
    }

    let reporter = ConsoleReporter::new(get_verbosity(&matches));
    let file = matches.get_one::<PathBuf>("file");
    let names: Vec<String> = matches
        .get_many::<String>("task-sets")
        .map(|names| names.cloned().collect())
        .unwrap_or_default();

    let task_sets = match load_task_sets(file.map(PathBuf::as_path), &TaskRegistry::default(), &reporter) {
        Ok((task_sets, _)) => task_sets,
        Err(e) => return report_load_error(&reporter, e),
    };

    let nothing_to_run = names.is_empty() && !task_sets.contains(DEFAULT_TASK_SET);
    if matches.get_flag("list") || nothing_to_run {
        let all = matches.get_flag("all") || task_sets.iter().all(|(_, set)| set.description().is_none());
        if reporter.verbosity() > Verbosity::Silent {
            println!("{}", "Task sets:".bold());
            print!("{}", list_task_sets(&task_sets, all));
        }
        return exit_code::SUCCESS;
    }

    let mut runner = Runner::new(task_sets).with_reporter(reporter);
    runner.run(names.as_slice()).exit_code
}

fn report_load_error(reporter: &ConsoleReporter, err: SlapError) -> i32 {
    let code = err.exit_code().unwrap_or(exit_code::ERROR);
    let kind = if code == exit_code::FILE_NOT_FOUND {
        ErrorEvent::FileNotFound
    } else {
        ErrorEvent::Error
    };

    let err = anyhow::Error::new(err);
    reporter.report(
        &[],
        &Event::Error {
            kind,
            error: &err,
            message: None,
        },
    );
    code
}
