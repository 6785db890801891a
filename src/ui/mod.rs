//! Console output
//!
//! Renders runner events to the terminal. Progress goes to stderr; echoed
//! messages go to stdout so they can be piped.

use crate::runner::{ErrorEvent, Event, Reporter};
use colored::Colorize;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    #[default]
    Normal = 2,
    Verbose = 3,
}

/// Turn colored output off (or back on) for the whole process
pub fn set_color(enabled: bool) {
    colored::control::set_override(enabled);
}

/// Format the `[taskSet:task]` breadcrumb
pub fn breadcrumb(log_keys: &[String]) -> String {
    if log_keys.is_empty() {
        String::new()
    } else {
        format!("[{}]", log_keys.join(":"))
    }
}

/// A [`Reporter`] printing to the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    verbosity: Verbosity,
}

impl ConsoleReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        ConsoleReporter { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Verbosity an event needs before it is printed
    fn level(event: &Event<'_>) -> Verbosity {
        match event {
            Event::Error { .. } | Event::Echo { .. } => Verbosity::Quiet,
            Event::RunningTaskSet { .. }
            | Event::RunningTask { task: Some(_), .. } => Verbosity::Normal,
            _ => Verbosity::Verbose,
        }
    }

    /// Render an event as a single line, without the breadcrumb
    pub fn format(event: &Event<'_>) -> String {
        match event {
            Event::ResolvingTaskSetsFile { path } => {
                format!("Resolving task-sets file: {}", path.display())
            }
            Event::ResolvingTaskSetsFileFinished { path } => {
                format!("Resolved task-sets file: {}", path.display())
            }
            Event::LoadingTaskSetsFile { path } => {
                format!("Loading task-sets file: {}", path.display())
            }
            Event::LoadingTaskSetsFileFinished { path } => {
                format!("Loaded task-sets file: {}", path.display())
            }
            Event::RunningTaskSet { task_set } => format!("Running task set: {}", task_set),
            Event::RunningTaskSetFinished {
                task_set,
                completed,
            } => {
                if *completed {
                    format!("Finished task set: {}", task_set)
                } else {
                    format!("Stopped task set: {}", task_set)
                }
            }
            Event::RunningDependentTaskSets { task_set, deps } => {
                format!("Running dependencies of {}: {}", task_set, deps.join(", "))
            }
            Event::RunningDependentTaskSetsFinished { task_set } => {
                format!("Finished dependencies of {}", task_set)
            }
            Event::RunningTask { task, task_set } => match task {
                Some(task) => format!("Running task: {}", task),
                None => format!("Running anonymous task in {}", task_set),
            },
            Event::PhaseStarting { phase, .. } => format!("Starting {}", phase),
            Event::PhaseFinished { phase, outcome, .. } => {
                format!("Finished {} ({})", phase, outcome)
            }
            Event::RunningTaskFinished { task, completed } => {
                let task = task.unwrap_or("anonymous task");
                if *completed {
                    format!("Finished task: {}", task)
                } else {
                    format!("Stopped at task: {}", task)
                }
            }
            Event::Error {
                kind,
                error,
                message,
            } => {
                let label = match kind {
                    ErrorEvent::TaskSetNotFound => "Task set not found",
                    ErrorEvent::FileNotFound => "File not found",
                    ErrorEvent::TaskError => "Task failed",
                    ErrorEvent::Error => "Error",
                };
                match message {
                    Some(message) => format!("{}: {}: {:#}", label, message, error),
                    None => format!("{}: {:#}", label, error),
                }
            }
            Event::Echo { message } => message.to_string(),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, log_keys: &[String], event: &Event<'_>) {
        if self.verbosity < Self::level(event) {
            return;
        }

        let crumb = breadcrumb(log_keys);
        let line = Self::format(event);
        match event {
            Event::Echo { .. } => {
                if crumb.is_empty() {
                    println!("{}", line);
                } else {
                    println!("{} {}", crumb.cyan(), line);
                }
            }
            Event::Error { .. } => eprintln!("{} {}", crumb.cyan(), line.red().bold()),
            Event::RunningTaskSet { .. } => eprintln!("{} {}", crumb.cyan(), line.green()),
            _ => eprintln!("{} {}", crumb.cyan(), line),
        }
    }
}
