//! Common test utilities
#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use slap::runner::{Event, Reporter, TaskEntry};
use tempfile::TempDir;

/// Create a temporary directory with a slap.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("slap.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Create a test config with an empty subdirectory next to it
pub fn create_test_config_in_subdir(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("slap.yml");
    let sub_dir = temp_dir.path().join("subdir");

    fs::write(&config_path, content).unwrap();
    fs::create_dir(&sub_dir).unwrap();

    (temp_dir, config_path, sub_dir)
}

/// Shared, ordered record of what ran
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// A bare task entry appending `label` to the journal
pub fn recording(label: &str, journal: &Journal) -> TaskEntry {
    let journal = Rc::clone(journal);
    let label = label.to_string();
    TaskEntry::callable(move |_| {
        journal.borrow_mut().push(label.clone());
        Ok(())
    })
}

/// A reporter keeping a one-line summary of every event
#[derive(Default, Clone)]
pub struct RecordingReporter {
    pub lines: Journal,
}

impl Reporter for RecordingReporter {
    fn report(&self, log_keys: &[String], event: &Event<'_>) {
        let line = match event {
            Event::RunningTaskSet { task_set } => format!("set:{}", task_set),
            Event::RunningDependentTaskSets { task_set, deps } => {
                format!("deps:{}:{}", task_set, deps.join(","))
            }
            Event::Echo { message } => format!("echo:{}:{}", log_keys.join(":"), message),
            Event::Error { kind, .. } => format!("error:{:?}", kind),
            _ => return,
        };
        self.lines.borrow_mut().push(line);
    }
}
