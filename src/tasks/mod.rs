//! Built-in task kinds
//!
//! Task-sets files refer to tasks by kind name. A [`TaskRegistry`] maps each
//! kind to a factory building the task entry from the entry's configuration.

pub mod copy;
pub mod echo;
pub mod fileset;
pub mod rm;
pub mod set;
pub mod shell;

pub use fileset::FileSet;

use crate::error::{ConfigError, ConfigResult, TaskError, TaskResult};
use crate::runner::{Task, TaskConfig, TaskEntry, TaskOptions};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Builds a task entry from its configuration
pub type TaskFactory = Box<dyn Fn(&TaskConfig) -> TaskResult<TaskEntry>>;

/// Task kinds by name
pub struct TaskRegistry {
    factories: BTreeMap<String, TaskFactory>,
}

impl TaskRegistry {
    /// A registry with no kinds at all
    pub fn empty() -> Self {
        TaskRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with every built-in kind
    pub fn with_builtins() -> Self {
        TaskRegistry::empty()
            .with("copy", copy::copy)
            .with("echo", echo::echo)
            .with("rm", rm::rm)
            .with("set", set::set)
            .with("shell", shell::shell)
    }

    /// Register a kind, replacing any kind of the same name
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&TaskConfig) -> TaskResult<TaskEntry> + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn with<F>(mut self, kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&TaskConfig) -> TaskResult<TaskEntry> + 'static,
    {
        self.register(kind, factory);
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kind names, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build an entry of the given kind for a task set
    pub fn create(&self, task_set: &str, kind: &str, config: &TaskConfig) -> ConfigResult<TaskEntry> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownTaskKind(kind.to_string()))?;

        factory(config).map_err(|e| ConfigError::InvalidEntry {
            task_set: task_set.to_string(),
            error: e.to_string(),
        })
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        TaskRegistry::with_builtins()
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Lifecycle options read from an entry's configuration
pub fn task_options(config: &TaskConfig) -> TaskResult<TaskOptions> {
    serde_json::from_value(Value::Object(config.fields().clone()))
        .map_err(|e| TaskError::InvalidArgument(format!("Invalid task options: {}", e)))
}

/// A lifecycle task named after the entry, or after its kind when unnamed
pub(crate) fn named_task(config: &TaskConfig, kind: &str) -> TaskResult<Task> {
    let mut task = Task::new(config.name().unwrap_or(kind))?.with_options(task_options(config)?);
    if let Some(description) = config.description() {
        task = task.with_description(description);
    }
    Ok(task)
}

/// A required string field
pub(crate) fn required_str<'a>(config: &'a TaskConfig, kind: &str, key: &str) -> TaskResult<&'a str> {
    config.get_str(key).ok_or_else(|| {
        TaskError::InvalidArgument(format!("The {} task requires a '{}' string", kind, key))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds() {
        let registry = TaskRegistry::default();
        let kinds: Vec<&str> = registry.kinds().collect();
        assert_eq!(kinds, vec!["copy", "echo", "rm", "set", "shell"]);
    }

    #[test]
    fn test_unknown_kind() {
        let registry = TaskRegistry::empty();
        let result = registry.create("main", "echo", &TaskConfig::new());
        assert!(matches!(result, Err(ConfigError::UnknownTaskKind(kind)) if kind == "echo"));
    }

    #[test]
    fn test_factory_errors_name_the_task_set() {
        let registry = TaskRegistry::default();
        let result = registry.create("deploy", "shell", &TaskConfig::new());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEntry { task_set, error })
                if task_set == "deploy" && error.contains("'command'")
        ));
    }

    #[test]
    fn test_custom_kind() {
        let registry = TaskRegistry::empty().with("noop", |_: &TaskConfig| {
            Ok(TaskEntry::callable(|_| Ok(())))
        });
        assert!(registry.contains("noop"));
        assert!(registry.create("main", "noop", &TaskConfig::new()).is_ok());
    }

    #[test]
    fn test_task_options_from_config() {
        let config = TaskConfig::new().with("always-run-post-execute", true);
        assert!(task_options(&config).unwrap().always_run_post_execute);
        assert!(!task_options(&TaskConfig::new()).unwrap().always_run_post_execute);

        let bad = TaskConfig::new().with("always-run-post-execute", "sometimes");
        assert!(task_options(&bad).is_err());
    }

    #[test]
    fn test_named_task() {
        let config = TaskConfig::new()
            .with("name", "compile")
            .with("description", "Build it");
        let task = named_task(&config, "shell").unwrap();
        assert_eq!(task.name(), "compile");
        assert_eq!(task.description(), Some("Build it"));

        assert_eq!(named_task(&TaskConfig::new(), "shell").unwrap().name(), "shell");
    }
}
