//! The `rm` task: remove files and directories
//!
//! `files` is a glob or a list of globs, optionally narrowed by `exclude`.
//! Directories are removed with their contents. The filesystem root is
//! never removed.

use crate::error::{TaskError, TaskResult};
use crate::runner::{Invocation, Task, TaskConfig, TaskEntry};
use crate::tasks::{named_task, FileSet};
use std::fs;
use std::path::Path;

pub fn rm(config: &TaskConfig) -> TaskResult<TaskEntry> {
    if config.get_strings("files").is_none() {
        return Err(TaskError::InvalidArgument(
            "The rm task requires 'files': a pattern or a list of patterns".to_string(),
        ));
    }

    let task = named_task(config, "rm")?
        .with_execute(|_: &Task, inv: &mut Invocation<'_>| execute_rm(inv));
    Ok(task.into())
}

fn execute_rm(inv: &mut Invocation<'_>) -> anyhow::Result<()> {
    let files = FileSet::from_config(inv.config, "files", inv.context)?.files()?;

    for file in files.iter().filter(|f| !is_root(f)) {
        inv.echo(format!("Removing {}", file.display()));
        remove(file).map_err(TaskError::from)?;
    }

    Ok(())
}

fn is_root(path: &Path) -> bool {
    fs::canonicalize(path)
        .map(|p| p.parent().is_none())
        .unwrap_or(false)
}

fn remove(path: &Path) -> std::io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
