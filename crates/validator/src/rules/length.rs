//! Length rule
//!
//! Strings are measured in Unicode scalar values by default (`"bytes": true`
//! switches to byte counting), arrays by element count and numbers by their
//! decimal representation. Absent and `null` values pass; combine with
//! `presence` to require a value.
//!
//! One schema entry may produce up to three rules, one per bound, so each
//! failure carries its own name and expected value:
//!
//! | option | rule name      |
//! |--------|----------------|
//! | `is`   | `wrong_length` |
//! | `min`  | `too_short`    |
//! | `max`  | `too_long`     |

use crate::error::OptionError;
use crate::options::RuleOptions;
use crate::rule::{Rule, RuleTest};
use crate::value::is_nullish;
use serde_json::Value;

// ============================================================================
// LENGTH MODE
// ============================================================================

/// How to count string length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LengthMode {
    /// Count bytes.
    Bytes,
    /// Count Unicode scalar values.
    #[default]
    Chars,
}

impl LengthMode {
    #[inline]
    fn measure(self, input: &str) -> usize {
        match self {
            LengthMode::Bytes => input.len(),
            LengthMode::Chars => input.chars().count(),
        }
    }
}

// ============================================================================
// LENGTH CHECK
// ============================================================================

/// Which bound a [`LengthCheck`] enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// Length must equal `expected`.
    Exact,
    /// Length must be at least `expected`.
    Min,
    /// Length must be at most `expected`.
    Max,
}

/// A single length bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LengthCheck {
    /// The bound kind.
    pub bound: Bound,
    /// The bound value.
    pub expected: usize,
    /// How strings are measured.
    pub mode: LengthMode,
}

impl LengthCheck {
    /// Length of a value, or `None` when it has no meaningful length.
    pub fn measure(&self, value: &Value) -> Option<usize> {
        match value {
            Value::String(s) => Some(self.mode.measure(s)),
            Value::Array(items) => Some(items.len()),
            Value::Number(n) => Some(n.to_string().len()),
            Value::Null | Value::Bool(_) | Value::Object(_) => None,
        }
    }

    /// Runs the check.
    pub fn test(&self, value: Option<&Value>) -> bool {
        if is_nullish(value) {
            return true;
        }
        value
            .and_then(|value| self.measure(value))
            .is_some_and(|len| match self.bound {
                Bound::Exact => len == self.expected,
                Bound::Min => len >= self.expected,
                Bound::Max => len <= self.expected,
            })
    }
}

/// Factory for `length`.
pub fn length(options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    let is = options.optional_usize("is")?;
    let min = options.optional_usize("min")?;
    let max = options.optional_usize("max")?;
    let mode = if options.flag("bytes")? {
        LengthMode::Bytes
    } else {
        LengthMode::Chars
    };

    if is.is_none() && min.is_none() && max.is_none() {
        return Err(OptionError::missing("`is`, `min` or `max`"));
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(OptionError::invalid(
                "min",
                format!("({min}) must not exceed `max` ({max})"),
            ));
        }
    }

    let rule = |name: &'static str, bound: Bound, expected: usize| {
        Rule::new(
            name,
            RuleTest::Length(LengthCheck {
                bound,
                expected,
                mode,
            }),
        )
        .with_data("expected", expected)
    };

    let mut rules = Vec::with_capacity(3);
    if let Some(is) = is {
        rules.push(rule("wrong_length", Bound::Exact, is));
    }
    if let Some(min) = min {
        rules.push(rule("too_short", Bound::Min, min));
    }
    if let Some(max) = max {
        rules.push(rule("too_long", Bound::Max, max));
    }
    Ok(rules)
}
