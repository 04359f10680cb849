//! Placeholder substitution over settings trees.
//!
//! Every occurrence of a literal token inside a string leaf is replaced,
//! at any depth. Non-string leaves pass through untouched.

use super::value::{Mapping, Value};

/// Returns a copy of `value` with every occurrence of `token` in string
/// leaves replaced by `replacement`.
pub fn substitute(value: &Value, token: &str, replacement: &str) -> Value {
    match value {
        Value::String(s) => Value::String(replace_token(s, token, replacement)),
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| substitute(item, token, replacement))
                .collect(),
        ),
        Value::Mapping(entries) => Value::Mapping(substitute_mapping(entries, token, replacement)),
        other => other.clone(),
    }
}

/// Applies [`substitute`] to every value of a mapping. Keys are left as is.
pub fn substitute_mapping(entries: &Mapping, token: &str, replacement: &str) -> Mapping {
    entries
        .iter()
        .map(|(key, value)| (key.clone(), substitute(value, token, replacement)))
        .collect()
}

fn replace_token(s: &str, token: &str, replacement: &str) -> String {
    // An empty token would match between every character.
    if token.is_empty() {
        return s.to_string();
    }
    s.replace(token, replacement)
}
