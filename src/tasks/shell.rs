//! The `shell` task: run a command through a shell
//!
//! Configuration:
//! - `command`: the command line, with `${...}` placeholders
//! - `dir`: working directory (default: the current directory)
//! - `interpreter`: the shell and its flags (default: `sh -c`)
//! - `quiet`: neither echo the command nor show its stdout
//! - `capture`: store the command's trimmed stdout at this context property

use crate::context::{interpolate, PropertyPath};
use crate::error::{TaskError, TaskResult};
use crate::runner::{Invocation, Task, TaskConfig, TaskEntry};
use crate::tasks::{named_task, required_str};
use anyhow::Context as _;
use serde_json::Value;
use std::process::{Command, Stdio};

const DEFAULT_INTERPRETER: &[&str] = &["sh", "-c"];

pub fn shell(config: &TaskConfig) -> TaskResult<TaskEntry> {
    required_str(config, "shell", "command")?;
    if config.get("interpreter").is_some() && interpreter(config).is_none() {
        return Err(TaskError::InvalidArgument(
            "The shell task's 'interpreter' must be a non-empty list of strings".to_string(),
        ));
    }

    let task = named_task(config, "shell")?
        .with_execute(|_: &Task, inv: &mut Invocation<'_>| execute_command(inv));
    Ok(task.into())
}

fn interpreter(config: &TaskConfig) -> Option<Vec<String>> {
    match config.get("interpreter") {
        None => Some(DEFAULT_INTERPRETER.iter().map(|s| s.to_string()).collect()),
        Some(_) => config.get_strings("interpreter").filter(|i| !i.is_empty()),
    }
}

/// Run the configured command, failing on a non-zero exit
fn execute_command(inv: &mut Invocation<'_>) -> anyhow::Result<()> {
    let config = inv.config;
    let command_line = interpolate(required_str(config, "shell", "command")?, inv.context)?;

    let quiet = config.get_bool("quiet").unwrap_or(false);
    if !quiet {
        inv.echo(format!("$ {}", command_line));
    }

    let interpreter = interpreter(config).unwrap_or_default();
    let (program, args) = interpreter
        .split_first()
        .ok_or_else(|| TaskError::InvalidArgument("Empty interpreter".to_string()))?;

    let mut command = Command::new(program);
    command.args(args).arg(&command_line);

    if let Some(dir) = config.get_str("dir") {
        command.current_dir(interpolate(dir, inv.context)?);
    }

    command.stdin(Stdio::inherit());
    command.stderr(Stdio::inherit());

    let capture = match config.get("capture") {
        Some(property) => Some(PropertyPath::from_value(property)?),
        None => None,
    };

    let (status, stdout) = if capture.is_some() {
        command.stdout(Stdio::piped());
        let output = command
            .output()
            .with_context(|| format!("Failed to start: {}", command_line))?;
        (output.status, Some(output.stdout))
    } else {
        command.stdout(if quiet { Stdio::null() } else { Stdio::inherit() });
        let status = command
            .status()
            .with_context(|| format!("Failed to start: {}", command_line))?;
        (status, None)
    };

    if !status.success() {
        return Err(TaskError::CommandFailed {
            command: command_line,
            code: status.code(),
        }
        .into());
    }

    if let (Some(path), Some(stdout)) = (capture, stdout) {
        let text = String::from_utf8_lossy(&stdout).trim_end().to_string();
        inv.context.set(&path, Value::String(text))?;
    }

    Ok(())
}
