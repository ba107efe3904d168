//! The validator: compiled per-attribute rule lists and their evaluation.

use crate::error::SchemaError;
use crate::path::Path;
use crate::registry::RuleRegistry;
use crate::report::{ErrorContext, ErrorDescriptor, ErrorReport};
use crate::rule::Rule;
use crate::schema::Schema;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct AttributeRules {
    path: Path,
    rules: Vec<Rule>,
}

/// Compiled validation schema.
///
/// Built once from a [`RuleRegistry`] and a [`Schema`]; every configuration
/// problem is reported by [`Validator::new`]. Validation itself never
/// fails: it produces [`ErrorDescriptor`]s.
///
/// # Examples
///
/// ```
/// use tessera_validator::{RuleRegistry, Schema, Validator};
/// use serde_json::json;
///
/// let schema = Schema::new().rule("name", "presence", true);
/// let validator = Validator::new(&RuleRegistry::defaults(), &schema).unwrap();
///
/// let errors = validator.validate_attribute(&json!({}), "name", None);
/// assert_eq!(errors[0].name, "presence");
/// assert_eq!(errors[0].context.value, None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    attributes: IndexMap<String, AttributeRules>,
}

impl Validator {
    /// Compiles `schema` against `registry`.
    pub fn new(registry: &RuleRegistry, schema: &Schema) -> Result<Self, SchemaError> {
        let mut attributes = IndexMap::with_capacity(schema.len());

        for (attribute, specs) in schema.iter() {
            let mut rules = Vec::new();
            for (name, spec) in specs {
                let resolved = registry
                    .resolve(name, spec)
                    .map_err(|e| e.for_attribute(attribute))?;
                rules.extend(resolved);
            }
            attributes.insert(
                attribute.to_string(),
                AttributeRules {
                    path: Path::parse(attribute),
                    rules,
                },
            );
        }

        let validator = Self { attributes };
        debug!(
            attributes = validator.attributes.len(),
            rules = validator.rule_count(),
            "compiled validation schema"
        );
        Ok(validator)
    }

    /// Compiles `schema` against the built-in rules only.
    pub fn with_defaults(schema: &Schema) -> Result<Self, SchemaError> {
        Self::new(&RuleRegistry::defaults(), schema)
    }

    /// Attributes declared in the schema, in order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Compiled rules for `attribute`, in declaration order.
    pub fn rules_for(&self, attribute: &str) -> &[Rule] {
        self.attributes
            .get(attribute)
            .map(|entry| entry.rules.as_slice())
            .unwrap_or_default()
    }

    /// Total number of compiled rules.
    pub fn rule_count(&self) -> usize {
        self.attributes.values().map(|entry| entry.rules.len()).sum()
    }

    /// Runs the eligible rules of one attribute.
    ///
    /// An attribute without rules yields no errors. Error order follows rule
    /// declaration order.
    pub fn validate_attribute(
        &self,
        record: &Value,
        attribute: &str,
        scope: Option<&str>,
    ) -> Vec<ErrorDescriptor> {
        let Some(entry) = self.attributes.get(attribute) else {
            return Vec::new();
        };
        let value = entry.path.get(record);

        entry
            .rules
            .iter()
            .filter(|rule| rule.is_eligible(record, scope))
            .filter(|rule| !rule.test(value, record, attribute))
            .map(|rule| {
                trace!(attribute, rule = rule.name(), "rule failed");
                ErrorDescriptor::new(
                    rule.name(),
                    ErrorContext::new(record.clone(), attribute, value.cloned(), rule.data()),
                )
            })
            .collect()
    }

    /// Runs every attribute that has at least one rule.
    ///
    /// Passing attributes get an empty slot in the report.
    pub fn validate_record(&self, record: &Value, scope: Option<&str>) -> ErrorReport {
        self.attributes
            .iter()
            .filter(|(_, entry)| !entry.rules.is_empty())
            .map(|(attribute, _)| {
                (
                    attribute.clone(),
                    self.validate_attribute(record, attribute, scope),
                )
            })
            .collect()
    }

    /// Whether `record` passes every eligible rule.
    pub fn is_valid(&self, record: &Value, scope: Option<&str>) -> bool {
        self.validate_record(record, scope).none()
    }
}
