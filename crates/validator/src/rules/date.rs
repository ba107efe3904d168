//! Date rule
//!
//! Accepts RFC 3339 timestamps (`2024-05-01T10:00:00Z`), plain dates
//! (`2024-05-01`, midnight UTC), naive timestamps (`2024-05-01T10:00:00`,
//! UTC) and integer Unix milliseconds. A schema entry produces:
//!
//! - `date`: the value must parse
//! - `too_late`: the value must be strictly before `before`
//! - `too_early`: the value must be strictly after `after`
//!
//! Unparseable values only fail `date`, so a bad value is reported once.

use crate::error::OptionError;
use crate::options::RuleOptions;
use crate::rule::{Rule, RuleTest};
use crate::value::is_nullish;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// A single date check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCheck {
    /// Value parses as a date.
    Valid,
    /// Value is strictly before the bound.
    Before(DateTime<Utc>),
    /// Value is strictly after the bound.
    After(DateTime<Utc>),
}

impl DateCheck {
    /// Runs the check. Absent and `null` pass.
    pub fn test(&self, value: Option<&Value>) -> bool {
        if is_nullish(value) {
            return true;
        }
        let parsed = value.and_then(parse_date);
        match self {
            Self::Valid => parsed.is_some(),
            Self::Before(bound) => parsed.is_none_or(|date| date < *bound),
            Self::After(bound) => parsed.is_none_or(|date| date > *bound),
        }
    }
}

/// Parses a JSON value as a UTC timestamp.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

fn bound(
    options: &RuleOptions,
    key: &str,
) -> Result<Option<(DateTime<Utc>, Value)>, OptionError> {
    options
        .get(key)
        .map(|raw| {
            parse_date(raw)
                .map(|date| (date, raw.clone()))
                .ok_or_else(|| OptionError::invalid(key, "is not a recognisable date"))
        })
        .transpose()
}

/// Factory for `date`. Requires `before` and/or `after`.
pub fn date(options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    let before = bound(options, "before")?;
    let after = bound(options, "after")?;

    if before.is_none() && after.is_none() {
        return Err(OptionError::missing("`before` or `after`"));
    }
    if let (Some((before, _)), Some((after, _))) = (&before, &after) {
        if after >= before {
            return Err(OptionError::invalid("after", "must be earlier than `before`"));
        }
    }

    let mut rules = vec![Rule::new("date", RuleTest::Date(DateCheck::Valid))];
    if let Some((date, raw)) = before {
        rules.push(
            Rule::new("too_late", RuleTest::Date(DateCheck::Before(date))).with_data("before", raw),
        );
    }
    if let Some((date, raw)) = after {
        rules.push(
            Rule::new("too_early", RuleTest::Date(DateCheck::After(date))).with_data("after", raw),
        );
    }
    Ok(rules)
}
