//! Inclusion, exclusion and acceptance rules.
//!
//! Membership compares JSON values structurally, except that numbers compare
//! by value (`1` equals `1.0`).

use crate::error::OptionError;
use crate::options::RuleOptions;
use crate::rule::{Rule, RuleTest};
use crate::value::is_nullish;
use serde_json::{Value, json};

/// Tokens accepted by `acceptance` when no `accept` list is given.
pub fn default_accept() -> Vec<Value> {
    vec![
        json!(true),
        json!("true"),
        json!(1),
        json!("1"),
        json!("yes"),
        json!("on"),
    ]
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn contains(list: &[Value], value: &Value) -> bool {
    list.iter().any(|item| loosely_equal(item, value))
}

/// Value is in `list`. Absent and `null` pass.
pub fn included(value: Option<&Value>, list: &[Value]) -> bool {
    if is_nullish(value) {
        return true;
    }
    value.is_some_and(|value| contains(list, value))
}

/// Value is not in `list`. Absent and `null` pass.
pub fn excluded(value: Option<&Value>, list: &[Value]) -> bool {
    if is_nullish(value) {
        return true;
    }
    value.is_some_and(|value| !contains(list, value))
}

/// Value is one of the accepted tokens. Absent fails.
pub fn accepted(value: Option<&Value>, accept: &[Value]) -> bool {
    value.is_some_and(|value| contains(accept, value))
}

/// Factory for `inclusion`. Requires `in`.
pub fn inclusion(options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    let list = options.require_list("in")?.to_vec();
    Ok(vec![
        Rule::new("inclusion", RuleTest::Inclusion(list.clone())).with_data("in", list),
    ])
}

/// Factory for `exclusion`. Requires `in`.
pub fn exclusion(options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    let list = options.require_list("in")?.to_vec();
    Ok(vec![
        Rule::new("exclusion", RuleTest::Exclusion(list.clone())).with_data("in", list),
    ])
}

/// Factory for `acceptance`. `accept` optionally overrides the token list.
pub fn acceptance(options: &RuleOptions) -> Result<Vec<Rule>, OptionError> {
    let accept = if options.has("accept") {
        options.require_list("accept")?.to_vec()
    } else {
        default_accept()
    };
    Ok(vec![
        Rule::new("acceptance", RuleTest::Acceptance(accept.clone())).with_data("accept", accept),
    ])
}
