//! Rule specifications as written in a schema.
//!
//! Each rule entry in a schema is one of:
//!
//! - `true` → enabled with default options
//! - `false` → explicitly disabled
//! - an options object → enabled with rule-specific parameters
//!
//! Two option keys are understood by every rule: `scope` (a string or a list
//! of strings) and `condition` (a boolean). Programmatic conditions are
//! attached with [`RuleOptions::when`].

use crate::error::{OptionError, SchemaError};
use crate::rule::Condition;
use crate::value::type_name;
use serde_json::{Map, Value};

const SCOPE_KEY: &str = "scope";
const CONDITION_KEY: &str = "condition";

// ============================================================================
// RULE OPTIONS
// ============================================================================

/// Parameters for one rule on one attribute.
#[derive(Debug, Clone, Default)]
pub struct RuleOptions {
    params: Map<String, Value>,
    condition: Option<Condition>,
    scopes: Vec<String>,
}

impl RuleOptions {
    /// Empty options (the rule's defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an options object, lifting out `scope` and `condition`.
    pub fn from_map(mut params: Map<String, Value>) -> Result<Self, OptionError> {
        let scopes = match params.remove(SCOPE_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(scope)) => vec![scope],
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(scope) => Ok(scope),
                    other => Err(OptionError::invalid(
                        SCOPE_KEY,
                        format!("must list strings, found {}", type_name(&other)),
                    )),
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(OptionError::invalid(
                    SCOPE_KEY,
                    format!("must be a string or a list, found {}", type_name(&other)),
                ));
            }
        };

        let condition = match params.remove(CONDITION_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Bool(enabled)) => Some(Condition::Constant(enabled)),
            Some(other) => {
                return Err(OptionError::invalid(
                    CONDITION_KEY,
                    format!("must be a boolean, found {}", type_name(&other)),
                ));
            }
        };

        Ok(Self {
            params,
            condition,
            scopes,
        })
    }

    /// Adds a rule parameter.
    #[must_use = "builder methods must be chained or built"]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Restricts the rule to a scope. May be called repeatedly.
    #[must_use = "builder methods must be chained or built"]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Gates the rule on a predicate over the record.
    #[must_use = "builder methods must be chained or built"]
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Condition::when(predicate));
        self
    }

    /// Rule-specific parameters (without `scope`/`condition`).
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Looks up a parameter.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    /// Whether a non-null parameter is present.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The condition, if any.
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Declared scopes.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Reads a required string parameter.
    pub fn require_str(&self, key: &str) -> Result<&str, OptionError> {
        match self.get(key) {
            None => Err(OptionError::missing(format!("`{key}`"))),
            Some(Value::String(s)) if !s.is_empty() => Ok(s),
            Some(Value::String(_)) => Err(OptionError::invalid(key, "must not be empty")),
            Some(other) => Err(OptionError::invalid(
                key,
                format!("must be a string, found {}", type_name(other)),
            )),
        }
    }

    /// Reads a required list parameter.
    pub fn require_list(&self, key: &str) -> Result<&[Value], OptionError> {
        match self.get(key) {
            None => Err(OptionError::missing(format!("`{key}`"))),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(OptionError::invalid(
                key,
                format!("must be a list, found {}", type_name(other)),
            )),
        }
    }

    /// Reads an optional non-negative integer parameter.
    pub fn optional_usize(&self, key: &str) -> Result<Option<usize>, OptionError> {
        self.get(key)
            .map(|value| {
                value
                    .as_u64()
                    .map(|n| n as usize)
                    .ok_or_else(|| OptionError::invalid(key, "must be a non-negative integer"))
            })
            .transpose()
    }

    /// Reads an optional numeric parameter.
    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, OptionError> {
        self.get(key)
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| OptionError::invalid(key, "must be a number"))
            })
            .transpose()
    }

    /// Reads an optional boolean parameter, defaulting to `false`.
    pub fn flag(&self, key: &str) -> Result<bool, OptionError> {
        match self.get(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(OptionError::invalid(
                key,
                format!("must be a boolean, found {}", type_name(other)),
            )),
        }
    }
}

// ============================================================================
// RULE SPEC
// ============================================================================

/// One schema entry: how a rule is configured for an attribute.
#[derive(Debug, Clone)]
pub enum RuleSpec {
    /// `false`: the rule is switched off for this attribute.
    Disabled,
    /// `true`: the rule runs with its defaults.
    Enabled,
    /// An options object.
    Options(RuleOptions),
}

impl RuleSpec {
    /// Parses a JSON schema entry for rule `rule`.
    pub fn from_value(rule: &str, value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::Bool(false) => Ok(Self::Disabled),
            Value::Bool(true) => Ok(Self::Enabled),
            Value::Object(map) => RuleOptions::from_map(map.clone())
                .map(Self::Options)
                .map_err(|source| SchemaError::InvalidOptions {
                    rule: rule.to_string(),
                    source,
                }),
            other => Err(SchemaError::MalformedSpec {
                rule: rule.to_string(),
                found: type_name(other),
            }),
        }
    }

    /// The options this spec enables the rule with, or `None` when disabled.
    pub fn options(&self) -> Option<RuleOptions> {
        match self {
            Self::Disabled => None,
            Self::Enabled => Some(RuleOptions::new()),
            Self::Options(options) => Some(options.clone()),
        }
    }
}

impl From<bool> for RuleSpec {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }
}

impl From<RuleOptions> for RuleSpec {
    fn from(options: RuleOptions) -> Self {
        Self::Options(options)
    }
}
