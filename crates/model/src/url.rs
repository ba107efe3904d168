//! URL templates.
//!
//! `{name}` placeholders are replaced by the matching attribute (nested paths
//! such as `{owner.id}` work), percent-encoded. Placeholders without a scalar
//! value are dropped, the empty path segments they leave are collapsed and a
//! trailing slash is trimmed, so `/users/{id}` resolves to `/users` for a
//! model that has no identity yet.

use serde_json::Value;
use tessera_validator::{path, value::as_text};

/// Resolves `template` against `params`. Pure and idempotent.
///
/// ```
/// use serde_json::json;
/// use tessera_model::url::resolve;
///
/// let params = json!({ "id": 7, "q": "a b" });
/// assert_eq!(resolve("/users/{id}", &params), "/users/7");
/// assert_eq!(resolve("/users/{missing}/", &params), "/users");
/// assert_eq!(resolve("/search?q={q}", &params), "/search?q=a%20b");
/// ```
pub fn resolve(template: &str, params: &Value) -> String {
    let (path, query) = match template.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (template, None),
    };

    let mut url = tidy_path(&substitute(path, params));
    if let Some(query) = query.map(|query| substitute(query, params)) {
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
    }
    url
}

fn substitute(template: &str, params: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        if let Some(value) = path::get(params, name).and_then(as_text) {
            out.push_str(&encode(&value));
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn encode(value: &str) -> String {
    ::url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Collapses repeated slashes (outside a `scheme://` prefix) and trims a
/// trailing slash.
fn tidy_path(raw: &str) -> String {
    let (prefix, rest) = match raw.find("://") {
        Some(index) => raw.split_at(index + 3),
        None => ("", raw),
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(prefix);
    let mut previous_slash = false;
    for c in rest.chars() {
        if c == '/' && previous_slash {
            continue;
        }
        previous_slash = c == '/';
        out.push(c);
    }

    if out.len() > prefix.len() + 1 && out.ends_with('/') {
        out.pop();
    }
    out
}
