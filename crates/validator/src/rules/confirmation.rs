//! Confirmation rule: the attribute must equal another attribute of the
//! record, e.g. `password_confirmation` against `password`.

use crate::error::OptionError;
use crate::options::RuleOptions;
use crate::path::Path;
use crate::rule::{Rule, RuleTest};
use serde_json::Value;

/// Value deep-equals the value at `with` (both absent counts as equal).
pub fn confirmed(value: Option<&Value>, record: &Value, with: &Path) -> bool {
    value == with.get(record)
}

/// Factory for `confirmation`. Requires `with`, the path of the confirmed
/// attribute.
pub fn confirmation(options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    let with = options.require_str("with")?;
    Ok(vec![
        Rule::new("confirmation", RuleTest::Confirmation(Path::parse(with))).with_data("with", with),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_other_attribute() {
        let with = Path::parse("password");
        let record = json!({ "password": "a", "confirm": "a" });
        assert!(confirmed(record.get("confirm"), &record, &with));

        let record = json!({ "password": "a", "confirm": "b" });
        assert!(!confirmed(record.get("confirm"), &record, &with));
    }

    #[test]
    fn nested_target() {
        let with = Path::parse("account.email");
        let record = json!({ "account": { "email": "x@y.z" } });
        assert!(confirmed(Some(&json!("x@y.z")), &record, &with));
    }

    #[test]
    fn requires_with() {
        assert_eq!(
            confirmation(&RuleOptions::new()).unwrap_err(),
            OptionError::missing("`with`")
        );
    }
}
