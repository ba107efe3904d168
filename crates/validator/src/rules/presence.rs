//! Presence and absence rules.

use crate::error::OptionError;
use crate::options::RuleOptions;
use crate::rule::{Rule, RuleTest};
use crate::value::is_blank;
use serde_json::Value;

/// Value is provided: not absent, `null`, whitespace-only, `[]` or `{}`.
pub fn present(value: Option<&Value>) -> bool {
    !is_blank(value)
}

/// Value is blank.
pub fn absent(value: Option<&Value>) -> bool {
    is_blank(value)
}

/// Factory for `presence`.
pub fn presence(_options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    Ok(vec![Rule::new("presence", RuleTest::Presence)])
}

/// Factory for `absence`.
pub fn absence(_options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    Ok(vec![Rule::new("absence", RuleTest::Absence)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presence_rejects_blank_values() {
        assert!(!present(None));
        assert!(!present(Some(&json!(null))));
        assert!(!present(Some(&json!("   "))));
        assert!(!present(Some(&json!([]))));
        assert!(present(Some(&json!(false))));
        assert!(present(Some(&json!(0))));
        assert!(present(Some(&json!("Luke"))));
    }

    #[test]
    fn absence_is_the_inverse() {
        assert!(absent(None));
        assert!(absent(Some(&json!(""))));
        assert!(!absent(Some(&json!("x"))));
    }
}
