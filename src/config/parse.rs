//! Task-sets file discovery, parsing and loading

use crate::config::schema::validate_task_sets_file;
use crate::config::types::TaskSetsFile;
use crate::context::Context;
use crate::error::{ConfigError, ConfigResult, SlapError};
use crate::runner::{Event, Reporter, TaskConfig, TaskEntry, TaskSet, TaskSets};
use crate::tasks::TaskRegistry;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default task-sets file names to search for
pub const TASK_SETS_FILE_NAMES: &[&str] = &["slap.yml", "slap.yaml"];

/// Find the task-sets file by searching current and parent directories
pub fn find_task_sets_file() -> ConfigResult<PathBuf> {
    find_task_sets_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the task-sets file starting from a specific directory
pub fn find_task_sets_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in TASK_SETS_FILE_NAMES {
            let path = current_dir.join(file_name);
            searched_paths.push(path.display().to_string());

            if path.is_file() {
                return Ok(path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a task-sets file from a path
pub fn parse_task_sets_file(path: &Path) -> Result<TaskSetsFile, SlapError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
        _ => ConfigError::ReadFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        },
    })?;

    parse_task_sets(&contents)
}

/// Parse a task-sets file from a string
pub fn parse_task_sets(yaml: &str) -> Result<TaskSetsFile, SlapError> {
    if yaml.trim().is_empty() {
        return Ok(TaskSetsFile::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Build runnable task sets from a parsed file
///
/// Every entry becomes its kind's task wrapped with the entry's configuration.
pub fn build_task_sets(file: TaskSetsFile, registry: &TaskRegistry) -> ConfigResult<TaskSets> {
    validate_task_sets_file(&file, registry)?;

    let mut task_sets = TaskSets::new();
    for (name, def) in file.task_sets {
        let mut task_set = TaskSet::new();
        if let Some(description) = def.description {
            task_set = task_set.with_description(description);
        }
        if !def.deps.is_empty() {
            task_set = task_set.with_deps(def.deps);
        }

        for entry in &def.tasks {
            let config = TaskConfig::from_fields(entry.fields());
            let task = registry.create(&name, entry.kind(), &config)?;
            task_set = task_set.with_task(TaskEntry::configured(config, task));
        }

        task_sets.insert(name, task_set);
    }

    if let Some(properties) = file.context {
        let mut context = Context::new();
        context
            .load_with(properties)
            .map_err(|e| ConfigError::Invalid(format!("Invalid context: {}", e)))?;
        task_sets = task_sets.with_context(context);
    }

    Ok(task_sets)
}

/// Resolve, read and build the task-sets file, reporting each step
///
/// Without an explicit path the file is searched for from the current directory.
pub fn load_task_sets(
    path: Option<&Path>,
    registry: &TaskRegistry,
    reporter: &dyn Reporter,
) -> Result<(TaskSets, PathBuf), SlapError> {
    let start = match path {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    reporter.report(&[], &Event::ResolvingTaskSetsFile { path: &start });
    let resolved = match path {
        Some(path) if path.is_file() => path.to_path_buf(),
        Some(path) => return Err(ConfigError::NotFound(path.display().to_string()).into()),
        None => find_task_sets_file_from(start.clone())?,
    };
    reporter.report(&[], &Event::ResolvingTaskSetsFileFinished { path: &resolved });

    reporter.report(&[], &Event::LoadingTaskSetsFile { path: &resolved });
    let file = parse_task_sets_file(&resolved)?;
    let task_sets = build_task_sets(file, registry)?;
    reporter.report(&[], &Event::LoadingTaskSetsFileFinished { path: &resolved });

    Ok((task_sets, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::NullReporter;
    use tempfile::TempDir;

    const SIMPLE: &str = r#"
task-sets:
  test:
    tasks:
      - task: echo
        message: test
"#;

    #[test]
    fn test_parse_simple_file() {
        let file = parse_task_sets(SIMPLE).unwrap();
        assert_eq!(file.task_sets.len(), 1);
        assert!(file.task_sets.contains_key("test"));
    }

    #[test]
    fn test_parse_empty_file() {
        let file = parse_task_sets("  \n").unwrap();
        assert!(file.task_sets.is_empty());
        assert!(file.context.is_none());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_task_sets("task-sets: [unclosed");
        assert!(matches!(result, Err(SlapError::Yaml(_))));
    }

    #[test]
    fn test_find_file_in_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("slap.yml");
        fs::write(&path, SIMPLE).unwrap();

        let found = find_task_sets_file_from(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn test_find_yaml_extension_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("slap.yaml");
        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();
        fs::write(&path, SIMPLE).unwrap();

        let found = find_task_sets_file_from(sub_dir).unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn test_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_task_sets_file_from(temp_dir.path().to_path_buf());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_build_task_sets() {
        let yaml = r#"
context:
  build:
    dir: out
task-sets:
  base:
    tasks: echo
  app:
    description: The app
    deps: base
    tasks:
      - task: set
        property: built
        value: true
"#;
        let task_sets = build_task_sets(parse_task_sets(yaml).unwrap(), &TaskRegistry::default()).unwrap();

        assert_eq!(task_sets.len(), 2);
        let app = task_sets.get("app").unwrap();
        assert_eq!(app.description(), Some("The app"));
        assert_eq!(*app.deps(), vec!["base".to_string()]);
        assert_eq!(app.tasks().len(), 1);
        assert_eq!(
            task_sets.context().unwrap().get("build.dir").unwrap(),
            Some(&serde_json::json!("out"))
        );
    }

    #[test]
    fn test_build_rejects_unknown_kind() {
        let yaml = r#"
task-sets:
  a:
    tasks: [warp]
"#;
        let result = build_task_sets(parse_task_sets(yaml).unwrap(), &TaskRegistry::default());
        assert!(matches!(result, Err(ConfigError::UnknownTaskKind(_))));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.yml");
        let result = load_task_sets(Some(missing.as_path()), &TaskRegistry::default(), &NullReporter);

        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), Some(crate::error::exit_code::FILE_NOT_FOUND));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yml");
        fs::write(&path, SIMPLE).unwrap();

        let (task_sets, resolved) = load_task_sets(Some(path.as_path()), &TaskRegistry::default(), &NullReporter).unwrap();
        assert_eq!(resolved, path);
        assert!(task_sets.contains("test"));
    }
}
