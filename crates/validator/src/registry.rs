//! Rule registry: rule name → rule factory.
//!
//! A registry is an explicit value. [`RuleRegistry::defaults`] builds the
//! built-in table; per-model additions live in their own registry and are
//! combined with [`RuleRegistry::merged`], where the additions win on name
//! collisions. Entries are never removed.

use crate::error::{OptionError, SchemaError};
use crate::options::{RuleOptions, RuleSpec};
use crate::rule::{Rule, RuleTest, TestFn};
use crate::rules;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Builds the compiled rules for one schema entry.
///
/// A factory may return several rules (e.g. `length` with `min` and `max`
/// yields one rule per bound). Option problems are reported as
/// [`OptionError`]s and surface when the validator is built.
pub type RuleFactory = Arc<dyn Fn(&RuleOptions) -> Result<Vec<Rule>, OptionError> + Send + Sync>;

/// Mapping from rule name to rule factory.
///
/// # Examples
///
/// ```
/// use tessera_validator::{RuleRegistry, RuleSpec};
/// use serde_json::Value;
///
/// let mut registry = RuleRegistry::defaults();
/// registry.register_test("even", |value, _record, _attribute| {
///     value.and_then(Value::as_i64).is_some_and(|n| n % 2 == 0)
/// });
///
/// let rules = registry.resolve("even", &RuleSpec::Enabled).unwrap();
/// assert_eq!(rules[0].name(), "even");
/// assert!(registry.resolve("bogus", &RuleSpec::Enabled).is_err());
/// ```
#[derive(Clone, Default)]
pub struct RuleRegistry {
    definitions: IndexMap<String, RuleFactory>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in rules.
    pub fn defaults() -> Self {
        let mut registry = Self::new();
        rules::register_defaults(&mut registry);
        registry
    }

    /// Adds or overwrites a rule factory. Last write wins.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&RuleOptions) -> Result<Vec<Rule>, OptionError> + Send + Sync + 'static,
    {
        self.definitions.insert(name.into(), Arc::new(factory));
        self
    }

    /// Registers a boolean test as a rule named `name`.
    ///
    /// The options' parameters become the rule's error-context data.
    pub fn register_test<F>(&mut self, name: impl Into<String>, test: F) -> &mut Self
    where
        F: Fn(Option<&Value>, &Value, &str) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let test: Arc<TestFn> = Arc::new(test);
        let rule_name = name.clone();
        self.register(name, move |options: &RuleOptions| {
            Ok(vec![
                Rule::new(rule_name.clone(), RuleTest::Custom(Arc::clone(&test)))
                    .with_data_map(options.params().clone()),
            ])
        })
    }

    /// Whether a rule with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// A new registry with `other`'s entries layered over this one's.
    pub fn merged(&self, other: &RuleRegistry) -> RuleRegistry {
        let mut definitions = self.definitions.clone();
        for (name, factory) in &other.definitions {
            definitions.insert(name.clone(), Arc::clone(factory));
        }
        RuleRegistry { definitions }
    }

    /// Compiles one schema entry.
    ///
    /// `Disabled` yields no rules. `Enabled` runs the factory with empty
    /// options. An unknown name is always an error.
    pub fn resolve(&self, name: &str, spec: &RuleSpec) -> Result<Vec<Rule>, SchemaError> {
        let Some(options) = spec.options() else {
            return Ok(Vec::new());
        };
        let factory = self
            .definitions
            .get(name)
            .ok_or_else(|| SchemaError::UnknownRule {
                rule: name.to_string(),
            })?;

        let rules = factory(&options).map_err(|source| SchemaError::InvalidOptions {
            rule: name.to_string(),
            source,
        })?;

        Ok(rules
            .into_iter()
            .map(|rule| apply_gates(rule, &options))
            .collect())
    }
}

fn apply_gates(mut rule: Rule, options: &RuleOptions) -> Rule {
    if let Some(condition) = options.condition() {
        rule = rule.with_condition(condition.clone());
    }
    if !options.scopes().is_empty() {
        rule = rule.scoped(options.scopes().iter().cloned());
    }
    rule
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("definitions", &self.definitions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults_contain_builtins() {
        let registry = RuleRegistry::defaults();
        for name in rules::BUILTIN_RULES {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.len(), rules::BUILTIN_RULES.len());
    }

    #[test]
    fn disabled_spec_resolves_to_nothing() {
        let registry = RuleRegistry::defaults();
        assert!(
            registry
                .resolve("presence", &RuleSpec::Disabled)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn unknown_rule_is_an_error() {
        let err = RuleRegistry::defaults()
            .resolve("bogus", &RuleSpec::Enabled)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownRule {
                rule: "bogus".into()
            }
        );
    }

    #[test]
    fn option_errors_name_the_rule() {
        let err = RuleRegistry::defaults()
            .resolve("confirmation", &RuleSpec::Enabled)
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidOptions { ref rule, .. } if rule == "confirmation"));
    }

    #[test]
    fn merged_additions_shadow_defaults() {
        let mut custom = RuleRegistry::new();
        custom.register("presence", |_: &RuleOptions| {
            Ok(vec![Rule::new("custom_presence", RuleTest::Presence)])
        });

        let merged = RuleRegistry::defaults().merged(&custom);
        let rules = merged.resolve("presence", &RuleSpec::Enabled).unwrap();
        assert_eq!(rules[0].name(), "custom_presence");
        assert_eq!(merged.len(), RuleRegistry::defaults().len());
    }

    #[test]
    fn scope_and_condition_are_applied_to_every_rule() {
        let spec = RuleSpec::from_value(
            "length",
            &json!({ "min": 1, "max": 3, "scope": "create", "condition": false }),
        )
        .unwrap();
        let rules = RuleRegistry::defaults().resolve("length", &spec).unwrap();
        assert_eq!(rules.len(), 2);
        for rule in &rules {
            assert_eq!(rule.scopes(), ["create".to_string()]);
            assert!(!rule.is_eligible(&json!({}), Some("create")));
        }
    }

    #[test]
    fn registered_test_carries_params_as_data() {
        let mut registry = RuleRegistry::new();
        registry.register_test("divisible", |value, _, _| {
            value.and_then(Value::as_i64).is_some_and(|n| n % 3 == 0)
        });
        let spec = RuleSpec::Options(RuleOptions::new().with("by", 3));
        let rules = registry.resolve("divisible", &spec).unwrap();
        assert_eq!(rules[0].data()["by"], json!(3));
        assert!(rules[0].test(Some(&json!(9)), &json!({}), "n"));
    }
}
