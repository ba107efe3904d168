//! Format rule: regular expression match (`with`) or non-match (`without`).

use crate::error::OptionError;
use crate::options::RuleOptions;
use crate::rule::{Rule, RuleTest};
use crate::value::{as_text, is_nullish};
use regex::Regex;
use serde_json::Value;

/// A compiled format check.
#[derive(Debug, Clone)]
pub struct FormatCheck {
    pattern: Regex,
    expect_match: bool,
}

impl FormatCheck {
    /// Value must match `pattern`.
    pub fn matching(pattern: Regex) -> Self {
        Self {
            pattern,
            expect_match: true,
        }
    }

    /// Value must not match `pattern`.
    pub fn not_matching(pattern: Regex) -> Self {
        Self {
            pattern,
            expect_match: false,
        }
    }

    /// The underlying pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Runs the check. Scalars are matched against their text form;
    /// arrays and objects never pass.
    pub fn test(&self, value: Option<&Value>) -> bool {
        if is_nullish(value) {
            return true;
        }
        value
            .and_then(as_text)
            .is_some_and(|text| self.pattern.is_match(&text) == self.expect_match)
    }
}

/// Factory for `format`. Exactly one of `with` / `without` is required.
pub fn format(options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    let (key, expect_match) = match (options.has("with"), options.has("without")) {
        (true, false) => ("with", true),
        (false, true) => ("without", false),
        (true, true) => {
            return Err(OptionError::invalid(
                "with",
                "cannot be combined with `without`",
            ));
        }
        (false, false) => return Err(OptionError::missing("`with` or `without`")),
    };

    let source = options.require_str(key)?;
    let pattern = Regex::new(source).map_err(|e| {
        OptionError::invalid(key, format!("is not a valid regular expression: {e}"))
    })?;
    let check = if expect_match {
        FormatCheck::matching(pattern)
    } else {
        FormatCheck::not_matching(pattern)
    };

    Ok(vec![
        Rule::new("format", RuleTest::Format(check)).with_data(key, source),
    ])
}
