//! A single compiled validation rule.
//!
//! A [`Rule`] pairs a name (the error taxonomy key) with a pure test over an
//! attribute value, plus metadata that is copied into the error context when
//! the test fails. Rules may be gated by a [`Condition`] over the whole record
//! and restricted to one or more validation scopes.
//!
//! The built-in rule kinds are a closed set of [`RuleTest`] variants; custom
//! rules plug in through [`RuleTest::Custom`].

use crate::path::Path;
use crate::rules::{date::DateCheck, format::FormatCheck, length::LengthCheck, numeric::NumberCheck};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Signature of a custom rule test: `(value, record, attribute) -> passes`.
pub type TestFn = dyn Fn(Option<&Value>, &Value, &str) -> bool + Send + Sync;

/// Signature of a record-level condition.
pub type ConditionFn = dyn Fn(&Value) -> bool + Send + Sync;

// ============================================================================
// CONDITION
// ============================================================================

/// Decides whether a rule is eligible for a given record.
#[derive(Clone)]
pub enum Condition {
    /// Fixed answer, typically from a JSON schema (`"condition": false`).
    Constant(bool),
    /// Evaluated against the record being validated.
    Predicate(Arc<ConditionFn>),
}

impl Condition {
    /// Wraps a closure as a condition.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Evaluates the condition against `record`.
    pub fn evaluate(&self, record: &Value) -> bool {
        match self {
            Self::Constant(enabled) => *enabled,
            Self::Predicate(predicate) => predicate(record),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(enabled) => f.debug_tuple("Constant").field(enabled).finish(),
            Self::Predicate(_) => f.write_str("Predicate(<function>)"),
        }
    }
}

// ============================================================================
// RULE TEST
// ============================================================================

/// What a rule checks.
#[derive(Clone)]
pub enum RuleTest {
    /// Value is not blank.
    Presence,
    /// Value is blank.
    Absence,
    /// Value is one of the accepted tokens.
    Acceptance(Vec<Value>),
    /// Length bound.
    Length(LengthCheck),
    /// Regular expression match or non-match.
    Format(FormatCheck),
    /// Value is one of the listed values.
    Inclusion(Vec<Value>),
    /// Value is none of the listed values.
    Exclusion(Vec<Value>),
    /// Value equals the value at another path of the record.
    Confirmation(Path),
    /// Date parsing and bounds.
    Date(DateCheck),
    /// Numeric parsing and bounds.
    Number(NumberCheck),
    /// User-supplied test.
    Custom(Arc<TestFn>),
}

impl RuleTest {
    /// Runs the test. Never mutates its inputs.
    pub fn test(&self, value: Option<&Value>, record: &Value, attribute: &str) -> bool {
        use crate::rules::{confirmation, membership, presence};

        match self {
            Self::Presence => presence::present(value),
            Self::Absence => presence::absent(value),
            Self::Acceptance(accept) => membership::accepted(value, accept),
            Self::Length(check) => check.test(value),
            Self::Format(check) => check.test(value),
            Self::Inclusion(list) => membership::included(value, list),
            Self::Exclusion(list) => membership::excluded(value, list),
            Self::Confirmation(with) => confirmation::confirmed(value, record, with),
            Self::Date(check) => check.test(value),
            Self::Number(check) => check.test(value),
            Self::Custom(test) => test(value, record, attribute),
        }
    }
}

impl fmt::Debug for RuleTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => f.write_str("Presence"),
            Self::Absence => f.write_str("Absence"),
            Self::Acceptance(accept) => f.debug_tuple("Acceptance").field(accept).finish(),
            Self::Length(check) => f.debug_tuple("Length").field(check).finish(),
            Self::Format(check) => f.debug_tuple("Format").field(check).finish(),
            Self::Inclusion(list) => f.debug_tuple("Inclusion").field(list).finish(),
            Self::Exclusion(list) => f.debug_tuple("Exclusion").field(list).finish(),
            Self::Confirmation(with) => f.debug_tuple("Confirmation").field(with).finish(),
            Self::Date(check) => f.debug_tuple("Date").field(check).finish(),
            Self::Number(check) => f.debug_tuple("Number").field(check).finish(),
            Self::Custom(_) => f.write_str("Custom(<function>)"),
        }
    }
}

// ============================================================================
// RULE
// ============================================================================

/// A compiled, immutable validation rule.
///
/// # Examples
///
/// ```
/// use tessera_validator::{Rule, RuleTest};
/// use serde_json::json;
///
/// let rule = Rule::new("presence", RuleTest::Presence).scoped(["create"]);
/// let record = json!({ "name": "" });
///
/// assert!(rule.is_eligible(&record, Some("create")));
/// assert!(!rule.is_eligible(&record, Some("update")));
/// assert!(!rule.test(record.get("name"), &record, "name"));
/// ```
#[derive(Debug, Clone)]
pub struct Rule {
    name: Cow<'static, str>,
    test: RuleTest,
    data: Map<String, Value>,
    condition: Option<Condition>,
    scopes: Vec<String>,
}

impl Rule {
    /// Creates an unconditional, unscoped rule without metadata.
    pub fn new(name: impl Into<Cow<'static, str>>, test: RuleTest) -> Self {
        Self {
            name: name.into(),
            test,
            data: Map::new(),
            condition: None,
            scopes: Vec::new(),
        }
    }

    /// Creates a rule backed by a closure.
    pub fn custom<F>(name: impl Into<Cow<'static, str>>, test: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &str) -> bool + Send + Sync + 'static,
    {
        Self::new(name, RuleTest::Custom(Arc::new(test)))
    }

    /// Adds a metadata entry that is merged into the error context.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Merges a whole metadata map (later keys win).
    #[must_use = "builder methods must be chained or built"]
    pub fn with_data_map(mut self, data: Map<String, Value>) -> Self {
        self.data.extend(data);
        self
    }

    /// Gates the rule behind a condition.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Restricts the rule to the given scopes.
    #[must_use = "builder methods must be chained or built"]
    pub fn scoped<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Error taxonomy key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metadata copied into the error context.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// The condition, if any.
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Scopes the rule is restricted to. Empty means "default rule".
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The underlying test.
    pub fn kind(&self) -> &RuleTest {
        &self.test
    }

    /// Whether the rule applies to `record` under the requested scope.
    ///
    /// Unscoped rules apply under every scope (and under none). Scoped rules
    /// apply only when the requested scope is one of theirs.
    pub fn is_eligible(&self, record: &Value, scope: Option<&str>) -> bool {
        let in_scope = self.scopes.is_empty()
            || scope.is_some_and(|requested| self.scopes.iter().any(|s| s == requested));
        in_scope && self.condition.as_ref().is_none_or(|c| c.evaluate(record))
    }

    /// Runs the rule's test.
    pub fn test(&self, value: Option<&Value>, record: &Value, attribute: &str) -> bool {
        self.test.test(value, record, attribute)
    }
}
