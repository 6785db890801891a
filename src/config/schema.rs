//! Task-sets file validation
//!
//! This module checks a parsed file before any task set is built from it.

use crate::config::types::{TaskSetDef, TaskSetsFile};
use crate::error::{ConfigError, ConfigResult};
use crate::tasks::TaskRegistry;
use serde_json::Value;
use std::collections::HashSet;

/// Validate a complete task-sets file
pub fn validate_task_sets_file(file: &TaskSetsFile, registry: &TaskRegistry) -> ConfigResult<()> {
    if let Some(context) = &file.context {
        if !matches!(context, Value::Object(_) | Value::Null) {
            return Err(ConfigError::Invalid(
                "context must be a mapping of property names to values".to_string(),
            ));
        }
    }

    for (name, task_set) in &file.task_sets {
        validate_task_set(name, task_set, registry)?;
    }

    detect_circular_dependencies(file)?;

    Ok(())
}

/// Validate a single task set
pub fn validate_task_set(name: &str, task_set: &TaskSetDef, registry: &TaskRegistry) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid("task set names must not be empty".to_string()));
    }

    for entry in &task_set.tasks {
        if !registry.contains(entry.kind()) {
            return Err(ConfigError::UnknownTaskKind(entry.kind().to_string()));
        }

        let fields = entry.fields();
        for key in ["name", "description"] {
            if let Some(value) = fields.get(key) {
                if !value.is_string() {
                    return Err(ConfigError::InvalidEntry {
                        task_set: name.to_string(),
                        error: format!("'{}' of a '{}' task must be a string", key, entry.kind()),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Detect cycles between task sets' dependencies
fn detect_circular_dependencies(file: &TaskSetsFile) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for name in file.task_sets.keys() {
        let mut stack = Vec::new();
        check_cycle(file, name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles in task set dependencies
///
/// Dependencies on unknown task sets are left for the runner to report.
fn check_cycle(
    file: &TaskSetsFile,
    name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    if stack.iter().any(|n| n == name) {
        stack.push(name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    if visited.contains(name) {
        return Ok(());
    }

    let Some(task_set) = file.task_sets.get(name) else {
        return Ok(());
    };

    stack.push(name.to_string());
    for dep in &task_set.deps {
        check_cycle(file, dep, visited, stack)?;
    }
    stack.pop();
    visited.insert(name.to_string());

    Ok(())
}
