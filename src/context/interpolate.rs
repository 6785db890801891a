//! Property interpolation for strings
//!
//! `${build.dir}` is replaced with the context property at that path, falling
//! back to an environment variable of the same name. Strings are inserted
//! as-is; any other value is inserted as JSON text.

use crate::context::Context;
use crate::error::{ContextError, ContextResult};
use regex::{Captures, Regex};
use serde_json::Value;
use std::env;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Upper bound on nested replacement passes
const MAX_PASSES: usize = 16;

/// Interpolate `${...}` placeholders, leaving unknown ones untouched
pub fn interpolate(s: &str, ctx: &Context) -> ContextResult<String> {
    let mut result = s.to_string();

    for _ in 0..MAX_PASSES {
        let mut changed = false;
        let next = PLACEHOLDER
            .replace_all(&result, |caps: &Captures| match lookup(ctx, &caps[1]) {
                Some(value) => {
                    changed = true;
                    value
                }
                None => caps[0].to_string(),
            })
            .into_owned();

        if !changed {
            return Ok(next);
        }
        result = next;
    }

    Err(ContextError::InvalidArgument(format!(
        "Recursive interpolation in '{}'",
        s
    )))
}

/// Interpolate, failing on the first placeholder that cannot be resolved
pub fn interpolate_strict(s: &str, ctx: &Context) -> ContextResult<String> {
    let result = interpolate(s, ctx)?;
    match PLACEHOLDER.captures(&result) {
        Some(caps) => Err(ContextError::Undefined(caps[1].to_string())),
        None => Ok(result),
    }
}

/// Interpolate every string of a list
pub fn interpolate_list(list: &[String], ctx: &Context) -> ContextResult<Vec<String>> {
    list.iter().map(|s| interpolate(s, ctx)).collect()
}

fn lookup(ctx: &Context, name: &str) -> Option<String> {
    let name = name.trim();
    match ctx.get(name) {
        Ok(Some(Value::String(s))) => Some(s.clone()),
        Ok(Some(Value::Null)) | Ok(None) | Err(_) => env::var(name).ok(),
        Ok(Some(value)) => Some(value.to_string()),
    }
}
