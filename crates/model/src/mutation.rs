//! Mutation pipelines: ordered, pure value transforms.
//!
//! A pipeline runs its steps left to right. Attributes without a pipeline
//! are left untouched.
//!
//! ```
//! use tessera_model::mutation::{self, Pipeline};
//! use serde_json::json;
//!
//! let pipeline = Pipeline::new().then(mutation::trim).then(mutation::lowercase);
//! assert_eq!(pipeline.apply(json!("  Luke ")), json!("luke"));
//! ```

use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

/// A single transform.
pub type MutationFn = dyn Fn(Value) -> Value + Send + Sync;

/// Ordered sequence of transforms.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<MutationFn>>,
}

impl Pipeline {
    /// An empty (identity) pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    #[must_use = "builder methods must be chained or built"]
    pub fn then<F>(mut self, step: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.push(step);
        self
    }

    /// Appends a step in place.
    pub fn push<F>(&mut self, step: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.steps.push(Arc::new(step));
    }

    /// Appends every step of `other`.
    pub fn extend(&mut self, other: &Pipeline) {
        self.steps.extend(other.steps.iter().cloned());
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline is the identity.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step over `value`.
    pub fn apply(&self, value: Value) -> Value {
        self.steps.iter().fold(value, |value, step| step(value))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps.len())
            .finish()
    }
}

// ============================================================================
// BUILT-IN MUTATIONS
// ============================================================================

fn map_string(value: Value, f: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

/// Strips surrounding whitespace from strings.
pub fn trim(value: Value) -> Value {
    map_string(value, |s| s.trim().to_string())
}

/// Lowercases strings.
pub fn lowercase(value: Value) -> Value {
    map_string(value, str::to_lowercase)
}

/// Uppercases strings.
pub fn uppercase(value: Value) -> Value {
    map_string(value, str::to_uppercase)
}

/// Turns empty strings, arrays and objects into `null`.
pub fn null_if_empty(value: Value) -> Value {
    let empty = match &value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    };
    if empty { Value::Null } else { value }
}

/// Parses numeric strings into numbers. Integers stay integers.
pub fn to_number(value: Value) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Value::from(n);
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or(value, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn steps_run_left_to_right() {
        let pipeline = Pipeline::new()
            .then(|v| json!(format!("{}a", v.as_str().unwrap_or_default())))
            .then(|v| json!(format!("{}b", v.as_str().unwrap_or_default())));
        assert_eq!(pipeline.apply(json!("")), json!("ab"));
        assert_eq!(Pipeline::new().apply(json!(1)), json!(1));
    }

    #[rstest]
    #[case(trim, json!("  a "), json!("a"))]
    #[case(lowercase, json!("AbC"), json!("abc"))]
    #[case(uppercase, json!("AbC"), json!("ABC"))]
    #[case(null_if_empty, json!(""), Value::Null)]
    #[case(null_if_empty, json!([]), Value::Null)]
    #[case(null_if_empty, json!(0), json!(0))]
    #[case(to_number, json!(" 42 "), json!(42))]
    #[case(to_number, json!("4.5"), json!(4.5))]
    #[case(to_number, json!("four"), json!("four"))]
    #[case(trim, json!(3), json!(3))]
    fn builtins(#[case] mutation: fn(Value) -> Value, #[case] input: Value, #[case] output: Value) {
        assert_eq!(mutation(input), output);
    }
}
