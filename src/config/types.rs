//! Core configuration types
//!
//! This module defines the data structures that represent a slap.yml task-sets file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level task-sets file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskSetsFile {
    /// Initial properties of the run context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Task sets by name
    #[serde(rename = "task-sets", default)]
    pub task_sets: BTreeMap<String, TaskSetDef>,
}

/// A task set definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskSetDef {
    /// Shown by `--list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Task sets to run first, in order
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_deps"
    )]
    pub deps: Vec<String>,

    /// Task entries, in order
    #[serde(default, deserialize_with = "deserialize_entries")]
    pub tasks: Vec<TaskEntryDef>,
}

/// A task entry: a bare kind name, or a kind plus configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TaskEntryDef {
    /// Kind name only
    Kind(String),

    /// Kind name with extra configuration fields
    Configured(ConfiguredEntry),
}

/// A task entry with configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfiguredEntry {
    /// Kind name, looked up in the task registry
    pub task: String,

    /// Every other field, handed to the task as its configuration
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TaskEntryDef {
    pub fn kind(&self) -> &str {
        match self {
            TaskEntryDef::Kind(kind) => kind,
            TaskEntryDef::Configured(entry) => &entry.task,
        }
    }

    /// Configuration fields; empty for bare kind names
    pub fn fields(&self) -> Map<String, Value> {
        match self {
            TaskEntryDef::Kind(_) => Map::new(),
            TaskEntryDef::Configured(entry) => entry.fields.clone(),
        }
    }
}

/// Custom deserializer for deps that handles both a single name and a list
fn deserialize_deps<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single task set name
        Value::String(s) => Ok(vec![s]),
        // List of task set names
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(D::Error::custom("deps entries must be task set names")),
            })
            .collect(),
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("deps must be a string or array")),
    }
}

/// Custom deserializer for task entries that handles both a single entry and a list
fn deserialize_entries<'de, D>(deserializer: D) -> Result<Vec<TaskEntryDef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(vec![TaskEntryDef::Kind(s)]),
        Value::Mapping(_) => {
            let entry = TaskEntryDef::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![entry])
        }
        Value::Sequence(seq) => {
            let mut entries = Vec::new();
            for item in seq {
                let entry = TaskEntryDef::deserialize(item).map_err(D::Error::custom)?;
                entries.push(entry);
            }
            Ok(entries)
        }
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("tasks must be a string, object, or array")),
    }
}
