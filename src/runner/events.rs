//! Lifecycle notifications
//!
//! The runner reports what it is doing through a [`Reporter`]. Reporters only
//! observe; nothing they do feeds back into the run.

use crate::error::exit_code;
use crate::runner::{Outcome, Phase};
use std::path::Path;

/// Classification of a recorded error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorEvent {
    /// Anything without a more specific classification
    Error,
    /// A task callback failed
    TaskError,
    /// A requested or depended-on task set does not exist
    TaskSetNotFound,
    /// The task-sets file could not be found
    FileNotFound,
}

impl ErrorEvent {
    /// Exit code associated with this kind of error, if any
    pub fn exit_code(self) -> Option<i32> {
        match self {
            ErrorEvent::TaskSetNotFound => Some(exit_code::TASK_SET_NOT_FOUND),
            ErrorEvent::FileNotFound => Some(exit_code::FILE_NOT_FOUND),
            ErrorEvent::Error | ErrorEvent::TaskError => None,
        }
    }
}

/// Something that happened during a run
#[derive(Debug)]
pub enum Event<'a> {
    ResolvingTaskSetsFile { path: &'a Path },
    ResolvingTaskSetsFileFinished { path: &'a Path },
    LoadingTaskSetsFile { path: &'a Path },
    LoadingTaskSetsFileFinished { path: &'a Path },
    RunningTaskSet { task_set: &'a str },
    RunningTaskSetFinished { task_set: &'a str, completed: bool },
    RunningDependentTaskSets { task_set: &'a str, deps: &'a [String] },
    RunningDependentTaskSetsFinished { task_set: &'a str },
    RunningTask { task: Option<&'a str>, task_set: &'a str },
    PhaseStarting { task: Option<&'a str>, phase: Phase },
    PhaseFinished { task: Option<&'a str>, phase: Phase, outcome: Outcome },
    RunningTaskFinished { task: Option<&'a str>, completed: bool },
    Error {
        kind: ErrorEvent,
        error: &'a anyhow::Error,
        message: Option<&'a str>,
    },
    Echo { message: &'a str },
}

/// Receives lifecycle notifications
///
/// `log_keys` is the breadcrumb of task-set and task names leading to the event.
pub trait Reporter {
    fn report(&self, log_keys: &[String], event: &Event<'_>);
}

/// A reporter that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _log_keys: &[String], _event: &Event<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_event_exit_codes() {
        assert_eq!(ErrorEvent::Error.exit_code(), None);
        assert_eq!(ErrorEvent::TaskError.exit_code(), None);
        assert_eq!(
            ErrorEvent::TaskSetNotFound.exit_code(),
            Some(exit_code::TASK_SET_NOT_FOUND)
        );
        assert_eq!(ErrorEvent::FileNotFound.exit_code(), Some(exit_code::FILE_NOT_FOUND));
    }
}
