//! Dotted property paths
//!
//! A property name such as `"build.output.dir"` addresses the key path
//! `["build", "output", "dir"]` through successively nested mappings.

use crate::error::{ContextError, ContextResult};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

/// One or more consecutive separators split a property name
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.+").expect("separator pattern is valid"));

/// A validated, non-empty sequence of property keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parse a dotted property name
    pub fn parse(name: &str) -> ContextResult<Self> {
        if name.is_empty() {
            return Err(required());
        }
        Ok(PropertyPath {
            segments: SEPARATOR.split(name).map(str::to_string).collect(),
        })
    }

    /// Build a path from already separated keys
    pub fn from_segments<I, S>(segments: I) -> ContextResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(required());
        }
        Ok(PropertyPath { segments })
    }

    /// Build a path from a loosely typed value, as found in task configuration
    ///
    /// Strings are parsed as dotted names and arrays must hold only strings.
    pub fn from_value(value: &Value) -> ContextResult<Self> {
        match value {
            Value::Null => Err(required()),
            Value::String(name) => Self::parse(name),
            Value::Array(items) => {
                let segments = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        other => Err(ContextError::InvalidArgument(format!(
                            "Unsupported property name segment type: {}",
                            value_kind(other)
                        ))),
                    })
                    .collect::<ContextResult<Vec<String>>>()?;
                Self::from_segments(segments)
            }
            other => Err(ContextError::InvalidArgument(format!(
                "Unsupported property name type: {}",
                value_kind(other)
            ))),
        }
    }

    /// The keys making up this path
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final key and the keys of its container
    pub fn split_last(&self) -> ContextResult<(&String, &[String])> {
        self.segments
            .split_last()
            .ok_or_else(|| ContextError::Logic("Property path has no segments".to_string()))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

fn required() -> ContextError {
    ContextError::InvalidArgument("Property name is required".to_string())
}

/// Human readable name of a value's shape
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Conversion into a [`PropertyPath`], accepting every supported path shape
pub trait IntoPropertyPath {
    fn into_property_path(self) -> ContextResult<PropertyPath>;
}

impl IntoPropertyPath for PropertyPath {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        Ok(self)
    }
}

impl IntoPropertyPath for &PropertyPath {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        Ok(self.clone())
    }
}

impl IntoPropertyPath for &str {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        PropertyPath::parse(self)
    }
}

impl IntoPropertyPath for String {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        PropertyPath::parse(&self)
    }
}

impl IntoPropertyPath for &String {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        PropertyPath::parse(self)
    }
}

impl IntoPropertyPath for &[&str] {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        PropertyPath::from_segments(self.iter().copied())
    }
}

impl<const N: usize> IntoPropertyPath for [&str; N] {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        PropertyPath::from_segments(self)
    }
}

impl IntoPropertyPath for Vec<String> {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        PropertyPath::from_segments(self)
    }
}

impl IntoPropertyPath for &[String] {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        PropertyPath::from_segments(self.iter().cloned())
    }
}

impl IntoPropertyPath for &Value {
    fn into_property_path(self) -> ContextResult<PropertyPath> {
        PropertyPath::from_value(self)
    }
}
