//! Recursive merging of attribute maps.
//!
//! Conflict policy: the incoming value wins, objects merge key-wise and
//! everything else (arrays included) is replaced wholesale.

use serde_json::Value;

/// Merges `incoming` into `base` in place.
pub fn merge(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, incoming) => *base = incoming,
    }
}

/// Returns `base` with `incoming` merged over it.
pub fn merged(base: &Value, incoming: &Value) -> Value {
    let mut out = base.clone();
    merge(&mut out, incoming.clone());
    out
}
