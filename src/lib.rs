//! Slap - a task-set runner
//!
//! Task sets are named, ordered lists of tasks that may depend on other task
//! sets. Running one runs its dependencies first, then its tasks, each
//! through a pre-execute, execute and post-execute lifecycle. Tasks share a
//! nested property context for the whole run.

// Public modules
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod runner;
pub mod tasks;
pub mod ui;

// Re-export commonly used types
pub use context::Context;
pub use error::{Result, SlapError};
pub use runner::{Outcome, Runner, Task, TaskEntry, TaskSet, TaskSets};

/// Current version of Slap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
