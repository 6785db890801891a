//! Task execution engine
//!
//! This module holds the task and task-set model, the lifecycle events a run
//! reports, and the [`Runner`] that walks task sets and their dependencies.

pub mod engine;
pub mod events;
pub mod outcome;
pub mod task;
pub mod task_set;

// Re-export main types
pub use engine::*;
pub use events::*;
pub use outcome::*;
pub use task::*;
pub use task_set::*;
