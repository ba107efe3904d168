//! Validation schema: attribute → rule name → [`RuleSpec`].
//!
//! Schemas are built programmatically with [`Schema::rule`] or loaded from
//! JSON, where they look like:
//!
//! ```json
//! {
//!   "name":     { "presence": true },
//!   "password": { "length": { "min": 8, "scope": "create" } },
//!   "password_confirmation": { "confirmation": { "with": "password" } }
//! }
//! ```
//!
//! Declaration order is preserved and determines error order.

use crate::error::SchemaError;
use crate::options::RuleSpec;
use crate::value::type_name;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Per-attribute rule declarations.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: IndexMap<String, IndexMap<String, RuleSpec>>,
}

impl Schema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an attribute without rules.
    #[must_use = "builder methods must be chained or built"]
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.entry(attribute.into()).or_default();
        self
    }

    /// Declares a rule on an attribute. Redeclaring a rule replaces its spec
    /// in place.
    #[must_use = "builder methods must be chained or built"]
    pub fn rule(
        mut self,
        attribute: impl Into<String>,
        rule: impl Into<String>,
        spec: impl Into<RuleSpec>,
    ) -> Self {
        self.attributes
            .entry(attribute.into())
            .or_default()
            .insert(rule.into(), spec.into());
        self
    }

    /// Parses a JSON schema document.
    pub fn from_json(document: &Value) -> Result<Self, SchemaError> {
        let Value::Object(attributes) = document else {
            return Err(SchemaError::MalformedSchema(format!(
                "expected an object, found {}",
                type_name(document)
            )));
        };

        let mut schema = Self::new();
        for (attribute, rules) in attributes {
            let Value::Object(rules) = rules else {
                return Err(SchemaError::MalformedSchema(format!(
                    "rules for `{attribute}` must be an object, found {}",
                    type_name(rules)
                )));
            };
            schema = schema.attribute(attribute.clone());
            for (rule, spec) in rules {
                let spec = RuleSpec::from_value(rule, spec)
                    .map_err(|e| e.for_attribute(attribute.clone()))?;
                schema = schema.rule(attribute.clone(), rule.clone(), spec);
            }
        }
        Ok(schema)
    }

    /// Declared attributes, in order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Rule declarations for one attribute.
    pub fn rules(&self, attribute: &str) -> Option<&IndexMap<String, RuleSpec>> {
        self.attributes.get(attribute)
    }

    /// Iterates `(attribute, rules)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, RuleSpec>)> {
        self.attributes
            .iter()
            .map(|(attribute, rules)| (attribute.as_str(), rules))
    }

    /// Number of declared attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether no attribute is declared.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl TryFrom<&Value> for Schema {
    type Error = SchemaError;

    fn try_from(document: &Value) -> Result<Self, Self::Error> {
        Self::from_json(document)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = Value::deserialize(deserializer)?;
        Self::from_json(&document).map_err(serde::de::Error::custom)
    }
}
