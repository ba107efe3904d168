//! End-to-end validation scenarios through the public API.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use tessera_validator::prelude::*;

fn validator(schema: Value) -> Validator {
    let schema = Schema::from_json(&schema).unwrap();
    Validator::new(&RuleRegistry::defaults(), &schema).unwrap()
}

fn names(errors: &[ErrorDescriptor]) -> Vec<&str> {
    errors.iter().map(|e| e.name.as_str()).collect()
}

// ============================================================================
// BUILT-IN RULES
// ============================================================================

#[test]
fn presence_on_missing_attribute() {
    let validator = validator(json!({ "name": { "presence": true } }));
    let record = json!({});

    let errors = validator.validate_attribute(&record, "name", None);

    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        json!([{
            "name": "presence",
            "context": { "record": {}, "attribute": "name" },
        }])
    );
    assert_eq!(errors[0].context.value, None);
}

#[test]
fn length_minimum_reports_expected_and_value() {
    let validator = validator(json!({ "password": { "length": { "min": 8 } } }));
    let record = json!({ "password": "123" });

    let errors = validator.validate_attribute(&record, "password", None);

    assert_eq!(names(&errors), ["too_short"]);
    assert_eq!(errors[0].context.param("expected"), Some(&json!(8)));
    assert_eq!(errors[0].context.value, Some(json!("123")));
}

#[test]
fn confirmation_references_its_target() {
    let validator = validator(json!({
        "password": {},
        "passwordConfirmation": { "confirmation": { "with": "password" } },
    }));

    let mismatch = json!({ "password": "a", "passwordConfirmation": "b" });
    let report = validator.validate_record(&mismatch, None);
    assert!(report.none_for("password"));
    let error = report.first("passwordConfirmation").unwrap();
    assert_eq!(error.name, "confirmation");
    assert_eq!(error.context.param("with"), Some(&json!("password")));

    let matching = json!({ "password": "a", "passwordConfirmation": "a" });
    assert!(validator.validate_record(&matching, None).none());
}

#[rstest]
#[case(json!({ "terms": { "acceptance": true } }), json!({ "terms": "no" }), "terms", "acceptance")]
#[case(json!({ "nick": { "absence": true } }), json!({ "nick": "x" }), "nick", "absence")]
#[case(json!({ "size": { "inclusion": { "in": ["s", "m"] } } }), json!({ "size": "xl" }), "size", "inclusion")]
#[case(json!({ "user": { "exclusion": { "in": ["root"] } } }), json!({ "user": "root" }), "user", "exclusion")]
#[case(json!({ "zip": { "format": { "with": "^[0-9]{5}$" } } }), json!({ "zip": "1234" }), "zip", "format")]
#[case(json!({ "code": { "length": { "is": 3 } } }), json!({ "code": "ab" }), "code", "wrong_length")]
#[case(json!({ "born": { "date": { "before": "2000-01-01" } } }), json!({ "born": "2001-01-01" }), "born", "too_late")]
#[case(json!({ "born": { "date": { "after": "2000-01-01" } } }), json!({ "born": "1999-01-01" }), "born", "too_early")]
#[case(json!({ "age": { "numericality": { "min": 18 } } }), json!({ "age": 12 }), "age", "too_small")]
fn single_failures(
    #[case] schema: Value,
    #[case] record: Value,
    #[case] attribute: &str,
    #[case] expected: &str,
) {
    let errors = validator(schema).validate_attribute(&record, attribute, None);
    assert_eq!(names(&errors), [expected]);
}

#[test]
fn optional_rules_pass_on_missing_values() {
    let validator = validator(json!({
        "bio": {
            "length": { "max": 10 },
            "format": { "with": "^[a-z]+$" },
            "inclusion": { "in": ["a"] },
            "date": { "after": "2000-01-01" },
            "numericality": true,
        }
    }));
    assert!(validator.validate_attribute(&json!({}), "bio", None).is_empty());
    assert!(validator.validate_attribute(&json!({ "bio": null }), "bio", None).is_empty());
}

// ============================================================================
// SCOPES AND CONDITIONS
// ============================================================================

#[test]
fn scoped_rules_only_run_in_their_scope() {
    let validator = validator(json!({
        "password": {
            "presence": { "scope": "create" },
            "length": { "min": 3 },
        }
    }));
    let record = json!({ "password": "" });

    assert_eq!(
        names(&validator.validate_attribute(&record, "password", Some("create"))),
        ["presence", "too_short"]
    );
    assert_eq!(
        names(&validator.validate_attribute(&record, "password", Some("update"))),
        ["too_short"]
    );
    assert_eq!(
        names(&validator.validate_attribute(&record, "password", None)),
        ["too_short"]
    );
}

#[test]
fn disabled_and_conditioned_rules_are_skipped() {
    let schema = Schema::from_json(&json!({
        "name": { "presence": false, "absence": { "condition": false } },
    }))
    .unwrap()
    .rule(
        "email",
        "presence",
        RuleOptions::new().when(|record| record["newsletter"] == true),
    );
    let validator = Validator::new(&RuleRegistry::defaults(), &schema).unwrap();

    let report = validator.validate_record(&json!({ "name": "x", "newsletter": false }), None);
    assert!(report.none());
    assert_eq!(report.attributes().collect::<Vec<_>>(), ["name", "email"]);

    let report = validator.validate_record(&json!({ "newsletter": true }), None);
    assert_eq!(report.failing().collect::<Vec<_>>(), ["email"]);
}

// ============================================================================
// CUSTOM RULES
// ============================================================================

#[test]
fn custom_rules_extend_and_shadow_defaults() {
    let mut custom = RuleRegistry::new();
    custom.register_test("slug", |value, _, _| {
        value
            .and_then(Value::as_str)
            .is_some_and(|s| s.chars().all(|c| c.is_ascii_lowercase() || c == '-'))
    });
    custom.register("presence", |_: &RuleOptions| {
        Ok(vec![Rule::custom("required", |value, _, _| value.is_some())])
    });
    let registry = RuleRegistry::defaults().merged(&custom);

    let schema = Schema::new()
        .rule("handle", "slug", RuleOptions::new().with("hint", "lowercase"))
        .rule("title", "presence", true);
    let validator = Validator::new(&registry, &schema).unwrap();

    let report = validator.validate_record(&json!({ "handle": "Not A Slug", "title": "" }), None);
    let handle = report.first("handle").unwrap();
    assert_eq!(handle.name, "slug");
    assert_eq!(handle.context.param("hint"), Some(&json!("lowercase")));
    // The shadowing `presence` only requires the key to exist.
    assert!(report.none_for("title"));
}

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

#[rstest]
#[case(json!({ "name": { "bogus": true } }))]
#[case(json!({ "a": { "confirmation": true } }))]
#[case(json!({ "a": { "length": {} } }))]
#[case(json!({ "a": { "date": true } }))]
#[case(json!({ "a": { "inclusion": {} } }))]
#[case(json!({ "a": { "exclusion": { "in": "x" } } }))]
#[case(json!({ "a": { "format": { "with": "a", "without": "b" } } }))]
#[case(json!({ "a": { "format": { "with": "(" } } }))]
fn misconfigured_schemas_fail_at_construction(#[case] schema: Value) {
    let schema = Schema::from_json(&schema).unwrap();
    let err = Validator::new(&RuleRegistry::defaults(), &schema).unwrap_err();
    assert!(err.attribute().is_some(), "{err}");
}

#[test]
fn unknown_rule_message_names_the_rule() {
    let schema = Schema::from_json(&json!({ "name": { "bogus": true } })).unwrap();
    let err = Validator::new(&RuleRegistry::defaults(), &schema).unwrap_err();
    assert!(err.is_unknown_rule());
    assert!(err.to_string().contains("`bogus`"));
}
