//! Run context
//!
//! The context is a nested property store that tasks use to hand intermediate
//! state to the tasks that run after them. Properties are addressed with dotted
//! paths (`"build.output.dir"`) or explicit key sequences.
//!
//! Only plain mappings are descended into while resolving a path. Any other
//! value (null, booleans, numbers, strings, arrays) is terminal: once one is
//! reached it is returned, even if path segments remain.

pub mod interpolate;
pub mod path;

pub use interpolate::{interpolate, interpolate_list, interpolate_strict};
pub use path::{value_kind, IntoPropertyPath, PropertyPath};

use crate::error::{ContextError, ContextResult};
use serde_json::{Map, Value};

/// Options for [`Context::resolve`]
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// When the property cannot be resolved, create it with this value.
    /// `Some(Value::Null)` creates a null property.
    pub create_if_missing: Option<Value>,
}

impl ResolveOptions {
    pub fn create_if_missing(value: Value) -> Self {
        ResolveOptions {
            create_if_missing: Some(value),
        }
    }
}

/// Data accepted by [`Context::load_with`]
#[derive(Debug, Clone)]
pub enum ContextData {
    /// JSON text, parsed before loading
    Json(String),
    /// Already structured data
    Value(Value),
}

impl From<&str> for ContextData {
    fn from(text: &str) -> Self {
        ContextData::Json(text.to_string())
    }
}

impl From<String> for ContextData {
    fn from(text: String) -> Self {
        ContextData::Json(text)
    }
}

impl From<Value> for ContextData {
    fn from(value: Value) -> Self {
        ContextData::Value(value)
    }
}

impl From<Map<String, Value>> for ContextData {
    fn from(map: Map<String, Value>) -> Self {
        ContextData::Value(Value::Object(map))
    }
}

impl ContextData {
    fn into_value(self) -> ContextResult<Value> {
        match self {
            ContextData::Json(text) => Ok(serde_json::from_str(&text)?),
            ContextData::Value(value) => Ok(value),
        }
    }
}

/// Nested property store shared by every task of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    properties: Map<String, Value>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Context {
            properties: Map::new(),
        }
    }

    /// Create a context holding the given properties
    pub fn with_properties(properties: Map<String, Value>) -> Self {
        Context { properties }
    }

    /// All stored properties
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Discard every stored property
    pub fn reset(&mut self) {
        self.properties = Map::new();
    }

    /// Resolve a property without creating anything
    ///
    /// A missing property resolves to `None`; only a malformed path is an error.
    pub fn get<P: IntoPropertyPath>(&self, path: P) -> ContextResult<Option<&Value>> {
        let path = path.into_property_path()?;
        descend(&self.properties, path.segments())
    }

    /// Resolve a property, optionally creating it when it is missing
    ///
    /// Creation only fills in missing intermediate mappings and the missing
    /// final property; an existing value is never replaced.
    pub fn resolve<P: IntoPropertyPath>(
        &mut self,
        path: P,
        options: ResolveOptions,
    ) -> ContextResult<Option<&Value>> {
        let path = path.into_property_path()?;
        let found = descend(&self.properties, path.segments())?.is_some();

        match options.create_if_missing {
            Some(value) if !found => {
                let created = descend_and_create(&mut self.properties, path.segments(), value)?;
                Ok(Some(&*created))
            }
            _ => descend(&self.properties, path.segments()),
        }
    }

    /// Resolve a property, creating it with `value` when it is missing
    pub fn get_or_create<P: IntoPropertyPath>(
        &mut self,
        path: P,
        value: Value,
    ) -> ContextResult<Option<&Value>> {
        self.resolve(path, ResolveOptions::create_if_missing(value))
    }

    /// Set a property, creating intermediate mappings as needed
    ///
    /// Fails when the path runs through a terminal value.
    pub fn set<P: IntoPropertyPath>(&mut self, path: P, value: Value) -> ContextResult<&Value> {
        let path = path.into_property_path()?;
        let slot = descend_and_create(&mut self.properties, path.segments(), Value::Null)?;
        *slot = value;
        Ok(&*slot)
    }

    /// Remove a property, returning the removed value
    pub fn remove<P: IntoPropertyPath>(&mut self, path: P) -> ContextResult<Option<Value>> {
        let path = path.into_property_path()?;
        let (key, parent) = path.split_last()?;

        let container = if parent.is_empty() {
            Some(&mut self.properties)
        } else {
            match descend_mut(&mut self.properties, parent)? {
                Some(Value::Object(map)) => Some(map),
                _ => None,
            }
        };

        Ok(container.and_then(|map| map.remove(key)))
    }

    /// Merge JSON text or structured data into the root of the context
    ///
    /// Top-level keys of the data replace existing properties of the same name.
    pub fn load_with<D: Into<ContextData>>(&mut self, data: D) -> ContextResult<()> {
        match data.into().into_value()? {
            Value::Null => Ok(()),
            Value::Object(map) => {
                self.properties.extend(map);
                Ok(())
            }
            other => Err(ContextError::InvalidArgument(format!(
                "Only a mapping can be merged into the context, got: {}",
                value_kind(&other)
            ))),
        }
    }

    /// Store JSON text or structured data at the given property
    pub fn load_with_at<D, P>(&mut self, data: D, path: P) -> ContextResult<()>
    where
        D: Into<ContextData>,
        P: IntoPropertyPath,
    {
        let value = data.into().into_value()?;
        self.set(path, value)?;
        Ok(())
    }
}

/// Walk `parts` down from `parent`, stopping early at terminal values
fn descend<'a>(parent: &'a Map<String, Value>, parts: &[String]) -> ContextResult<Option<&'a Value>> {
    let (key, rest) = parts
        .split_first()
        .ok_or_else(|| ContextError::Logic("Should not have descended this far".to_string()))?;

    match parent.get(key) {
        Some(Value::Object(child)) if !rest.is_empty() => descend(child, rest),
        found => Ok(found),
    }
}

fn descend_mut<'a>(
    parent: &'a mut Map<String, Value>,
    parts: &[String],
) -> ContextResult<Option<&'a mut Value>> {
    let (key, rest) = parts
        .split_first()
        .ok_or_else(|| ContextError::Logic("Should not have descended this far".to_string()))?;

    if rest.is_empty() {
        return Ok(parent.get_mut(key));
    }

    match parent.get_mut(key) {
        Some(Value::Object(child)) => descend_mut(child, rest),
        found => Ok(found),
    }
}

/// Walk `parts` down from `parent`, materializing missing mappings
///
/// The final property is set to `value` only when it is missing.
fn descend_and_create<'a>(
    parent: &'a mut Map<String, Value>,
    parts: &[String],
    value: Value,
) -> ContextResult<&'a mut Value> {
    let (key, rest) = parts
        .split_first()
        .ok_or_else(|| ContextError::Logic("Should not have descended this far".to_string()))?;

    if rest.is_empty() {
        return Ok(parent.entry(key.clone()).or_insert(value));
    }

    match parent
        .entry(key.clone())
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(child) => descend_and_create(child, rest, value),
        terminal => Err(ContextError::InvalidArgument(format!(
            "Cannot create '{}' beneath the {} property '{}'",
            rest.join("."),
            value_kind(terminal),
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_property_resolves_to_none() {
        let ctx = Context::new();
        assert_eq!(ctx.get("foo.bar").unwrap(), None);
    }

    #[test]
    fn test_empty_property_name_is_invalid() {
        let ctx = Context::new();
        assert!(matches!(ctx.get(""), Err(ContextError::InvalidArgument(_))));
        assert!(matches!(
            ctx.get(Vec::<String>::new()),
            Err(ContextError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_if_missing() {
        let mut ctx = Context::new();
        let created = ctx.get_or_create("a.b.c", json!(1)).unwrap().cloned();
        assert_eq!(created, Some(json!(1)));
        assert_eq!(ctx.get("a.b.c").unwrap(), Some(&json!(1)));
        assert_eq!(ctx.get("a").unwrap(), Some(&json!({"b": {"c": 1}})));
    }

    #[test]
    fn test_create_if_missing_with_null() {
        let mut ctx = Context::new();
        let created = ctx.get_or_create("flag", Value::Null).unwrap().cloned();
        assert_eq!(created, Some(Value::Null));
        assert!(ctx.properties().contains_key("flag"));
    }

    #[test]
    fn test_create_never_overwrites() {
        let mut ctx = Context::new();
        ctx.set("a.b", json!("first")).unwrap();
        let resolved = ctx.get_or_create("a.b", json!("second")).unwrap().cloned();
        assert_eq!(resolved, Some(json!("first")));
        assert_eq!(ctx.get("a.b").unwrap(), Some(&json!("first")));
    }

    #[test]
    fn test_set_overwrites() {
        let mut ctx = Context::new();
        ctx.set("a.b", json!(1)).unwrap();
        let stored = ctx.set("a.b", json!(2)).unwrap().clone();
        assert_eq!(stored, json!(2));
        assert_eq!(ctx.get("a.b").unwrap(), Some(&json!(2)));
    }

    #[test]
    fn test_terminal_value_stops_resolution() {
        let mut ctx = Context::new();
        for value in [json!("text"), json!(3), json!([1, 2]), json!(true), Value::Null] {
            ctx.set("root", value.clone()).unwrap();
            assert_eq!(ctx.get("root.child.leaf").unwrap(), Some(&value));
        }
    }

    #[test]
    fn test_arrays_are_never_descended() {
        let mut ctx = Context::new();
        ctx.set("list", json!([{"x": 1}])).unwrap();
        assert_eq!(ctx.get("list.0.x").unwrap(), Some(&json!([{"x": 1}])));
    }

    #[test]
    fn test_set_beneath_terminal_fails() {
        let mut ctx = Context::new();
        ctx.set("name", json!("slap")).unwrap();
        assert!(matches!(
            ctx.set("name.first", json!("s")),
            Err(ContextError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut ctx = Context::new();
        ctx.set("a.b", json!(1)).unwrap();
        ctx.set("a.c", json!(2)).unwrap();

        assert_eq!(ctx.remove("a.b").unwrap(), Some(json!(1)));
        assert_eq!(ctx.get("a.b").unwrap(), None);
        assert_eq!(ctx.get("a.c").unwrap(), Some(&json!(2)));
    }

    #[test]
    fn test_remove_top_level_and_missing() {
        let mut ctx = Context::new();
        ctx.set("top", json!(true)).unwrap();
        assert_eq!(ctx.remove("top").unwrap(), Some(json!(true)));
        assert_eq!(ctx.remove("top").unwrap(), None);
        assert_eq!(ctx.remove("never.set.here").unwrap(), None);
    }

    #[test]
    fn test_remove_beneath_terminal_value() {
        let mut ctx = Context::new();
        ctx.set("a", json!("leaf")).unwrap();
        ctx.set("n.deep", json!({"x": 1})).unwrap();

        assert_eq!(ctx.remove("a.b").unwrap(), None);
        assert_eq!(ctx.get("a").unwrap(), Some(&json!("leaf")));
        assert_eq!(ctx.remove("n.deep.x").unwrap(), Some(json!(1)));
        assert_eq!(ctx.get("n.deep").unwrap(), Some(&json!({})));
    }

    #[test]
    fn test_sequence_paths() {
        let mut ctx = Context::new();
        ctx.set(["a", "b"], json!("v")).unwrap();
        assert_eq!(ctx.get("a.b").unwrap(), Some(&json!("v")));
        assert_eq!(ctx.get(&json!(["a", "b"])).unwrap(), Some(&json!("v")));
    }

    #[test]
    fn test_unsupported_path_type() {
        let ctx = Context::new();
        assert!(matches!(
            ctx.get(&json!({"not": "a path"})),
            Err(ContextError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_load_with_json_merges_root() {
        let mut ctx = Context::new();
        ctx.set("keep", json!(1)).unwrap();
        ctx.set("over", json!(1)).unwrap();
        ctx.load_with(r#"{"over": 2, "fresh": {"x": 3}}"#).unwrap();

        assert_eq!(ctx.get("keep").unwrap(), Some(&json!(1)));
        assert_eq!(ctx.get("over").unwrap(), Some(&json!(2)));
        assert_eq!(ctx.get("fresh.x").unwrap(), Some(&json!(3)));
    }

    #[test]
    fn test_load_with_at_path() {
        let mut ctx = Context::new();
        ctx.load_with_at(json!({"dir": "out"}), "build").unwrap();
        assert_eq!(ctx.get("build.dir").unwrap(), Some(&json!("out")));
    }

    #[test]
    fn test_load_with_rejects_bad_input() {
        let mut ctx = Context::new();
        assert!(matches!(ctx.load_with("{nope"), Err(ContextError::Json(_))));
        assert!(matches!(
            ctx.load_with(json!([1, 2])),
            Err(ContextError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_reset() {
        let mut ctx = Context::new();
        ctx.set("a", json!(1)).unwrap();
        ctx.reset();
        assert!(ctx.properties().is_empty());
    }

    #[test]
    fn test_descend_without_segments_is_a_logic_error() {
        let map = Map::new();
        assert!(matches!(descend(&map, &[]), Err(ContextError::Logic(_))));
    }
}
