//! Error types for Slap

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Slap operations
pub type Result<T> = std::result::Result<T, SlapError>;

/// Main error type for Slap
#[derive(Error, Debug)]
pub enum SlapError {
    /// Task-set file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Context property errors
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// Task construction errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Run errors raised by the engine itself
    #[error("Run error: {0}")]
    Run(#[from] RunError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SlapError {
    /// The exit code this error carries, if it has one of its own
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SlapError::Config(e) => e.exit_code(),
            SlapError::Run(e) => e.exit_code(),
            _ => None,
        }
    }
}

/// Task-set file discovery and parsing errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File not found (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown task kind '{0}'")]
    UnknownTaskKind(String),

    #[error("Task set '{task_set}' has an invalid task entry: {error}")]
    InvalidEntry { task_set: String, error: String },

    #[error("Failed to read '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

impl ConfigError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ConfigError::NotFound(_) => Some(exit_code::FILE_NOT_FOUND),
            _ => None,
        }
    }
}

/// Context property errors
#[derive(Error, Debug)]
pub enum ContextError {
    /// Malformed property name
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal invariant violation while walking a property path
    #[error("Logic error: {0}")]
    Logic(String),

    /// A `${...}` placeholder naming nothing known
    #[error("Undefined property: {0}")]
    Undefined(String),

    /// Malformed JSON handed to `load_with`
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Task construction errors
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A shell command ran but did not succeed
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors recorded by the runner while running task sets
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Could not find the task set named '{0}'")]
    TaskSetNotFound(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Task '{task}' failed: {source}")]
    CallbackFailure {
        task: String,
        #[source]
        source: anyhow::Error,
    },
}

impl RunError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunError::TaskSetNotFound(_) => Some(exit_code::TASK_SET_NOT_FOUND),
            RunError::CallbackFailure { source, .. } => exit_code_of(source),
            RunError::CircularDependency(_) => None,
        }
    }
}

/// Process exit codes reported by a run
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const ERROR: i32 = 1;
    pub const FILE_NOT_FOUND: i32 = 2;
    pub const TASK_SET_NOT_FOUND: i32 = 3;
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for context operations
pub type ContextResult<T> = std::result::Result<T, ContextError>;

/// Specialized result type for task construction
pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Find the exit code carried by an arbitrary callback error, if any
pub fn exit_code_of(err: &anyhow::Error) -> Option<i32> {
    if let Some(e) = err.downcast_ref::<SlapError>() {
        return e.exit_code();
    }
    if let Some(e) = err.downcast_ref::<RunError>() {
        return e.exit_code();
    }
    err.downcast_ref::<ConfigError>().and_then(ConfigError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_set_not_found_has_own_exit_code() {
        let err = anyhow::Error::new(RunError::TaskSetNotFound("nope".to_string()));
        assert_eq!(exit_code_of(&err), Some(exit_code::TASK_SET_NOT_FOUND));
    }

    #[test]
    fn test_config_not_found_through_slap_error() {
        let err = anyhow::Error::new(SlapError::from(ConfigError::NotFound("slap.yml".into())));
        assert_eq!(exit_code_of(&err), Some(exit_code::FILE_NOT_FOUND));
    }

    #[test]
    fn test_callback_failure_inherits_source_exit_code() {
        let err = anyhow::Error::new(RunError::CallbackFailure {
            task: "lookup".to_string(),
            source: anyhow::Error::new(RunError::TaskSetNotFound("x".to_string())),
        });
        assert_eq!(exit_code_of(&err), Some(exit_code::TASK_SET_NOT_FOUND));
    }

    #[test]
    fn test_plain_error_has_no_exit_code() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(exit_code_of(&err), None);
    }
}
