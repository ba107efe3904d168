//! Numericality rule. Numbers and numeric strings are accepted.
//!
//! Produces `not_a_number` plus, depending on options, `not_an_integer`
//! (`integer: true`), `too_small` (`min`) and `too_large` (`max`). Bounds are
//! inclusive.

use crate::error::OptionError;
use crate::options::RuleOptions;
use crate::rule::{Rule, RuleTest};
use crate::value::{as_number, is_nullish};
use serde_json::Value;

/// A single numeric check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberCheck {
    /// Value is numeric.
    Numeric,
    /// Value has no fractional part.
    Integer,
    /// Value is at least the bound.
    Min(f64),
    /// Value is at most the bound.
    Max(f64),
}

impl NumberCheck {
    /// Runs the check. Absent and `null` pass; non-numeric values only fail
    /// [`NumberCheck::Numeric`].
    pub fn test(&self, value: Option<&Value>) -> bool {
        if is_nullish(value) {
            return true;
        }
        let number = value.and_then(as_number);
        match self {
            Self::Numeric => number.is_some(),
            Self::Integer => number.is_none_or(|n| n.fract() == 0.0),
            Self::Min(min) => number.is_none_or(|n| n >= *min),
            Self::Max(max) => number.is_none_or(|n| n <= *max),
        }
    }
}

/// Factory for `numericality`.
pub fn numericality(options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    let min = options.optional_f64("min")?;
    let max = options.optional_f64("max")?;
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(OptionError::invalid("min", "must not exceed `max`"));
        }
    }

    let mut rules = vec![Rule::new("not_a_number", RuleTest::Number(NumberCheck::Numeric))];
    if options.flag("integer")? {
        rules.push(Rule::new("not_an_integer", RuleTest::Number(NumberCheck::Integer)));
    }
    if let Some(min) = min {
        rules.push(
            Rule::new("too_small", RuleTest::Number(NumberCheck::Min(min)))
                .with_data("expected", options.get("min").cloned().unwrap_or(Value::Null)),
        );
    }
    if let Some(max) = max {
        rules.push(
            Rule::new("too_large", RuleTest::Number(NumberCheck::Max(max)))
                .with_data("expected", options.get("max").cloned().unwrap_or(Value::Null)),
        );
    }
    Ok(rules)
}
