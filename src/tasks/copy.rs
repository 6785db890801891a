//! The `copy` task: copy files and directories
//!
//! `from` names the sources (a glob or a list of globs, optionally narrowed by
//! `exclude`). Exactly one of `to-file` and `to-dir` names the destination.
//! Missing destination directories are created. Directories are copied
//! recursively and only into `to-dir`.

use crate::context::interpolate;
use crate::error::{TaskError, TaskResult};
use crate::runner::{Invocation, Task, TaskConfig, TaskEntry};
use crate::tasks::{named_task, FileSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where copied files go
#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    File(PathBuf),
    Dir(PathBuf),
}

pub fn copy(config: &TaskConfig) -> TaskResult<TaskEntry> {
    let task = named_task(config, "copy")?
        .with_pre_execute(|_: &Task, inv: &mut Invocation<'_>| -> anyhow::Result<()> {
            validate(inv.config)?;
            Ok(())
        })
        .with_execute(|_: &Task, inv: &mut Invocation<'_>| execute_copy(inv));
    Ok(task.into())
}

/// Check the configuration before anything is touched
fn validate(config: &TaskConfig) -> TaskResult<()> {
    if config.get_strings("from").is_none() {
        return Err(TaskError::InvalidArgument(
            "The copy task requires 'from': a pattern or a list of patterns".to_string(),
        ));
    }

    match (config.get("to-file"), config.get("to-dir")) {
        (Some(_), Some(_)) => Err(TaskError::InvalidArgument(
            "The copy task takes either 'to-file' or 'to-dir', not both".to_string(),
        )),
        (None, None) => Err(TaskError::InvalidArgument(
            "The copy task requires a 'to-file' or 'to-dir' destination".to_string(),
        )),
        (Some(v), None) | (None, Some(v)) if !v.is_string() => Err(TaskError::InvalidArgument(
            "The copy task's destination must be a string".to_string(),
        )),
        _ => Ok(()),
    }
}

fn destination(inv: &Invocation<'_>) -> anyhow::Result<Destination> {
    if let Some(file) = inv.config.get_str("to-file") {
        return Ok(Destination::File(interpolate(file, inv.context)?.into()));
    }
    match inv.config.get_str("to-dir") {
        Some(dir) => Ok(Destination::Dir(interpolate(dir, inv.context)?.into())),
        None => Err(TaskError::InvalidArgument("No copy destination".to_string()).into()),
    }
}

fn execute_copy(inv: &mut Invocation<'_>) -> anyhow::Result<()> {
    let sources = FileSet::from_config(inv.config, "from", inv.context)?.files()?;
    let destination = destination(inv)?;

    match &destination {
        Destination::File(file) => {
            if sources.len() > 1 {
                return Err(TaskError::InvalidArgument(format!(
                    "Misconfiguration? The copy task does not concatenate files: {} files would each be copied to the file {}",
                    sources.len(),
                    file.display()
                ))
                .into());
            }

            if let Some(source) = sources.first() {
                if source.is_dir() {
                    return Err(TaskError::InvalidArgument(format!(
                        "Cannot copy the directory {} to the file {}",
                        source.display(),
                        file.display()
                    ))
                    .into());
                }
                if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                    create_dir(inv, parent)?;
                }
                inv.echo(format!("Copying {} to {}", source.display(), file.display()));
                fs::copy(source, file).map_err(TaskError::from)?;
            }
        }
        Destination::Dir(dir) => {
            create_dir(inv, dir)?;
            for source in &sources {
                let Some(name) = source.file_name() else {
                    continue;
                };
                inv.echo(format!("Copying {} to {}", source.display(), dir.display()));
                copy_path(source, &dir.join(name)).map_err(TaskError::from)?;
            }
        }
    }

    Ok(())
}

fn create_dir(inv: &Invocation<'_>, dir: &Path) -> TaskResult<()> {
    if !dir.exists() {
        inv.echo(format!("Creating {}", dir.display()));
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Copy a file, or a directory recursively
fn copy_path(source: &Path, target: &Path) -> io::Result<()> {
    if source.is_dir() {
        fs::create_dir_all(target)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_path(&entry.path(), &target.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(source, target).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{Runner, TaskSet, TaskSets};
    use serde_json::json;
    use tempfile::TempDir;

    fn scratch() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.txt"), "beta").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "gamma").unwrap();
        dir
    }

    fn p(dir: &TempDir, rel: &str) -> String {
        dir.path().join(rel).display().to_string()
    }

    fn run(config: TaskConfig) -> Runner {
        let entry = TaskEntry::configured(config.clone(), copy(&config).unwrap());
        let sets = TaskSets::new().with("main", TaskSet::new().with_task(entry));
        let mut runner = Runner::new(sets);
        runner.run(&["main"]);
        runner
    }

    #[test]
    fn test_validate() {
        assert!(validate(&TaskConfig::new().with("to-dir", "out")).is_err());
        assert!(validate(&TaskConfig::new().with("from", "a")).is_err());
        assert!(validate(
            &TaskConfig::new()
                .with("from", "a")
                .with("to-dir", "d")
                .with("to-file", "f")
        )
        .is_err());
        assert!(validate(&TaskConfig::new().with("from", "a").with("to-dir", 3)).is_err());
        assert!(validate(&TaskConfig::new().with("from", json!(["a", "b"])).with("to-dir", "d")).is_ok());
    }

    #[test]
    fn test_invalid_config_fails_before_execute() {
        let runner = run(TaskConfig::new().with("from", "x"));
        assert!(!runner.can_continue());
        assert!(runner.last_error().is_some());
    }

    #[test]
    fn test_copy_to_dir_creates_it() {
        let dir = scratch();
        let runner = run(TaskConfig::new()
            .with("from", p(&dir, "*.txt"))
            .with("to-dir", p(&dir, "out/deep")));

        assert!(runner.can_continue());
        assert_eq!(fs::read_to_string(dir.path().join("out/deep/a.txt")).unwrap(), "alpha");
        assert_eq!(fs::read_to_string(dir.path().join("out/deep/b.txt")).unwrap(), "beta");
    }

    #[test]
    fn test_copy_directory_recursively() {
        let dir = scratch();
        let runner = run(TaskConfig::new()
            .with("from", p(&dir, "nested"))
            .with("to-dir", p(&dir, "out")));

        assert!(runner.can_continue());
        assert_eq!(
            fs::read_to_string(dir.path().join("out/nested/c.txt")).unwrap(),
            "gamma"
        );
    }

    #[test]
    fn test_copy_to_file() {
        let dir = scratch();
        let runner = run(TaskConfig::new()
            .with("from", p(&dir, "a.txt"))
            .with("to-file", p(&dir, "out/renamed.txt")));

        assert!(runner.can_continue());
        assert_eq!(
            fs::read_to_string(dir.path().join("out/renamed.txt")).unwrap(),
            "alpha"
        );
    }

    #[test]
    fn test_many_sources_to_one_file_is_an_error() {
        let dir = scratch();
        let runner = run(TaskConfig::new()
            .with("from", p(&dir, "*.txt"))
            .with("to-file", p(&dir, "all.txt")));

        assert!(!runner.can_continue());
        assert!(format!("{:#}", runner.last_error().unwrap()).contains("concatenate"));
        assert!(!dir.path().join("all.txt").exists());
    }

    #[test]
    fn test_exclude() {
        let dir = scratch();
        let runner = run(TaskConfig::new()
            .with("from", p(&dir, "*.txt"))
            .with("exclude", "**/b.txt")
            .with("to-dir", p(&dir, "out")));

        assert!(runner.can_continue());
        assert!(dir.path().join("out/a.txt").exists());
        assert!(!dir.path().join("out/b.txt").exists());
    }
}
