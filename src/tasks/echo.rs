//! The `echo` task: print a message

use crate::context::interpolate;
use crate::error::TaskResult;
use crate::runner::{TaskConfig, TaskEntry};

/// Echo `message`, with `${...}` placeholders filled in from the context
pub fn echo(_config: &TaskConfig) -> TaskResult<TaskEntry> {
    Ok(TaskEntry::callable(|inv| {
        if let Some(message) = inv.config.get_str("message") {
            let message = interpolate(message, inv.context)?;
            inv.echo(message);
        }
        Ok(())
    }))
}
