//! Structured validation results.
//!
//! A failed rule becomes an [`ErrorDescriptor`]: the rule name plus an
//! [`ErrorContext`] holding the record, the attribute, the value and the
//! rule's metadata. Descriptors are collected per attribute in an
//! [`ErrorReport`].
//!
//! The serialized descriptor shape is stable and meant for UI renderers:
//!
//! ```json
//! { "name": "too_short",
//!   "context": { "expected": 8, "record": { "password": "123" },
//!                "attribute": "password", "value": "123" } }
//! ```

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

const CANONICAL_KEYS: [&str; 3] = ["record", "attribute", "value"];

// ============================================================================
// ERROR CONTEXT
// ============================================================================

/// Context of a failed rule.
///
/// `record`, `attribute` and `value` are canonical and can never be
/// shadowed by rule metadata: metadata keys with those names are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    /// The (mutated) record that was validated.
    pub record: Value,
    /// Attribute path the rule is declared on.
    pub attribute: String,
    /// The attribute's value; `None` when absent.
    pub value: Option<Value>,
    /// Rule metadata, e.g. `expected`, `with`, `in`.
    pub data: Map<String, Value>,
}

impl ErrorContext {
    /// Builds a context, discarding metadata that collides with the
    /// canonical keys.
    pub fn new(
        record: Value,
        attribute: impl Into<String>,
        value: Option<Value>,
        data: &Map<String, Value>,
    ) -> Self {
        let data = data
            .iter()
            .filter(|(key, _)| !CANONICAL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self {
            record,
            attribute: attribute.into(),
            value,
            data,
        }
    }

    /// Looks up a metadata entry.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Flattens the context into one JSON object, metadata first and
    /// canonical keys last. An absent value is omitted.
    pub fn to_json(&self) -> Value {
        let mut map = self.data.clone();
        map.insert("record".into(), self.record.clone());
        map.insert("attribute".into(), Value::String(self.attribute.clone()));
        if let Some(value) = &self.value {
            map.insert("value".into(), value.clone());
        }
        Value::Object(map)
    }
}

impl Serialize for ErrorContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.data.len() + 2 + usize::from(self.value.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in &self.data {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("record", &self.record)?;
        map.serialize_entry("attribute", &self.attribute)?;
        if let Some(value) = &self.value {
            map.serialize_entry("value", value)?;
        }
        map.end()
    }
}

// ============================================================================
// ERROR DESCRIPTOR
// ============================================================================

/// One failed rule.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ErrorDescriptor {
    /// Rule name, used for message lookup.
    pub name: String,
    /// Failure context.
    pub context: ErrorContext,
}

impl ErrorDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, context: ErrorContext) -> Self {
        Self {
            name: name.into(),
            context,
        }
    }
}

// ============================================================================
// ERROR REPORT
// ============================================================================

/// Attribute → ordered list of failures.
///
/// Slots are created when an attribute is registered and persist (possibly
/// empty) until the report is dropped. Queries on unregistered attributes
/// answer as if the slot were empty.
///
/// # Examples
///
/// ```
/// use tessera_validator::ErrorReport;
///
/// let mut report = ErrorReport::new();
/// report.register("name");
///
/// assert!(report.none());
/// assert!(report.get("name").is_empty());
/// assert!(report.get("never_seen").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct ErrorReport {
    slots: IndexMap<String, Vec<ErrorDescriptor>>,
}

impl ErrorReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures `attribute` has a slot. Existing errors are kept.
    pub fn register(&mut self, attribute: impl Into<String>) {
        self.slots.entry(attribute.into()).or_default();
    }

    /// Whether `attribute` has a slot.
    pub fn is_registered(&self, attribute: &str) -> bool {
        self.slots.contains_key(attribute)
    }

    /// Failures for `attribute`, empty when none.
    pub fn get(&self, attribute: &str) -> &[ErrorDescriptor] {
        self.slots
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First failure for `attribute`.
    pub fn first(&self, attribute: &str) -> Option<&ErrorDescriptor> {
        self.get(attribute).first()
    }

    /// Replaces one attribute's slot, leaving the others untouched.
    pub fn replace(&mut self, attribute: impl Into<String>, errors: Vec<ErrorDescriptor>) {
        self.slots.insert(attribute.into(), errors);
    }

    /// Replaces every slot present in `other`.
    pub fn absorb(&mut self, other: ErrorReport) {
        for (attribute, errors) in other.slots {
            self.slots.insert(attribute, errors);
        }
    }

    /// Empties every slot, keeping registrations.
    pub fn clear(&mut self) {
        for errors in self.slots.values_mut() {
            errors.clear();
        }
    }

    /// Whether any attribute has a failure.
    pub fn any(&self) -> bool {
        self.slots.values().any(|errors| !errors.is_empty())
    }

    /// Whether no attribute has a failure.
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Whether `attribute` has a failure.
    pub fn any_for(&self, attribute: &str) -> bool {
        !self.get(attribute).is_empty()
    }

    /// Whether `attribute` has no failure.
    pub fn none_for(&self, attribute: &str) -> bool {
        !self.any_for(attribute)
    }

    /// Total number of failures.
    pub fn count(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Registered attributes, in registration order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Attributes that currently have failures.
    pub fn failing(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|(_, errors)| !errors.is_empty())
            .map(|(attribute, _)| attribute.as_str())
    }

    /// Iterates `(attribute, failures)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorDescriptor])> {
        self.slots
            .iter()
            .map(|(attribute, errors)| (attribute.as_str(), errors.as_slice()))
    }

    /// Serializes the report as a JSON object.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl FromIterator<(String, Vec<ErrorDescriptor>)> for ErrorReport {
    fn from_iter<I: IntoIterator<Item = (String, Vec<ErrorDescriptor>)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn descriptor(name: &str, attribute: &str) -> ErrorDescriptor {
        ErrorDescriptor::new(
            name,
            ErrorContext::new(json!({}), attribute, None, &Map::new()),
        )
    }

    #[test]
    fn canonical_keys_cannot_be_shadowed() {
        let data = json!({ "record": "spoofed", "value": 1, "expected": 8 });
        let context = ErrorContext::new(
            json!({ "password": "123" }),
            "password",
            Some(json!("123")),
            data.as_object().unwrap(),
        );
        assert_eq!(
            context.to_json(),
            json!({
                "expected": 8,
                "record": { "password": "123" },
                "attribute": "password",
                "value": "123",
            })
        );
        assert_eq!(context.param("record"), None);
    }

    #[test]
    fn serialization_matches_to_json() {
        let context = ErrorContext::new(json!({}), "name", None, &Map::new());
        let descriptor = ErrorDescriptor::new("presence", context.clone());
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({ "name": "presence", "context": context.to_json() })
        );
    }

    #[test]
    fn replace_only_touches_one_slot() {
        let mut report = ErrorReport::new();
        report.replace("a", vec![descriptor("presence", "a")]);
        report.replace("b", vec![descriptor("presence", "b")]);
        report.replace("a", Vec::new());

        assert!(report.none_for("a"));
        assert!(report.any_for("b"));
        assert_eq!(report.count(), 1);
        assert_eq!(report.failing().collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn clear_keeps_registrations() {
        let mut report = ErrorReport::new();
        report.register("a");
        report.replace("b", vec![descriptor("presence", "b")]);
        report.clear();

        assert!(report.none());
        assert_eq!(report.attributes().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn register_keeps_existing_errors() {
        let mut report = ErrorReport::new();
        report.replace("a", vec![descriptor("presence", "a")]);
        report.register("a");
        assert_eq!(report.get("a").len(), 1);
    }

    #[test]
    fn report_serializes_as_object() {
        let mut report = ErrorReport::new();
        report.register("name");
        assert_eq!(report.to_json(), json!({ "name": [] }));
    }
}
