//! The `set` task: store a value in the run context

use crate::context::PropertyPath;
use crate::error::{TaskError, TaskResult};
use crate::runner::{TaskConfig, TaskEntry};
use serde_json::Value;

/// Set `property` (a dotted path or a list of keys) to `value`
///
/// A missing `value` stores null.
pub fn set(config: &TaskConfig) -> TaskResult<TaskEntry> {
    let property = config
        .get("property")
        .ok_or_else(|| TaskError::InvalidArgument("The set task requires a 'property'".to_string()))?;
    let path = PropertyPath::from_value(property)
        .map_err(|e| TaskError::InvalidArgument(e.to_string()))?;
    let value = config.get("value").cloned().unwrap_or(Value::Null);

    Ok(TaskEntry::callable(move |inv| {
        inv.context.set(&path, value.clone())?;
        Ok(())
    }))
}
