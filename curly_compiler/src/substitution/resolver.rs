//! Dotted and indexed path lookup against substitution data
//!
//! Path grammar: a bare name followed by any number of `.name` or `[index]`
//! segments. An index is a decimal literal or a nested path, and a nested
//! path is always resolved against the top-level scope of the tier being
//! searched, not against the value currently being indexed.

use crate::config::compile_time::resolution::{MAX_PATH_DEPTH, MAX_PATH_LENGTH};
use crate::logging::{codes, Code};
use crate::substitution::data::SubstitutionData;
use crate::substitution::names::{validate_name, NameCheck};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Reference '{path}' not found in recipient or global data")]
    NotFound { path: String },

    #[error("Invalid name '{name}' in reference '{path}'")]
    InvalidName { name: String, path: String },

    #[error("Reserved word '{name}' used in reference '{path}'")]
    ReservedName { name: String, path: String },

    #[error("Malformed index in reference '{path}': {reason}")]
    MalformedIndex { path: String, reason: &'static str },

    #[error("Reference '{path}' nests deeper than {max} segments")]
    PathTooDeep { path: String, max: usize },

    #[error("Reference of {length} bytes exceeds the {max} byte limit")]
    PathTooLong { length: usize, max: usize },
}

impl ResolveError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::NotFound { .. } => codes::resolution::REFERENCE_NOT_FOUND,
            Self::InvalidName { .. } => codes::resolution::INVALID_NAME,
            Self::ReservedName { .. } => codes::resolution::RESERVED_NAME,
            Self::MalformedIndex { .. } => codes::resolution::MALFORMED_INDEX,
            Self::PathTooDeep { .. } => codes::resolution::PATH_TOO_DEEP,
            Self::PathTooLong { .. } => codes::resolution::PATH_TOO_LONG,
        }
    }
}

/// Resolve `path` within one scope.
///
/// `Ok(None)` is a silent miss: the other tier may still hold the value.
/// `Err` is a malformed reference and is reported by the caller.
pub fn resolve<'a>(scope: &'a Value, path: &str) -> Result<Option<&'a Value>, ResolveError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(ResolveError::PathTooLong {
            length: path.len(),
            max: MAX_PATH_LENGTH,
        });
    }

    PathWalker {
        root: scope,
        reference: path,
    }
    .walk(scope, path, 0)
}

/// Look a reference up in the recipient tier, then the global tier.
/// Whitespace inside the reference is ignored.
pub fn lookup<'a>(data: &'a SubstitutionData, reference: &str) -> Result<&'a Value, ResolveError> {
    let path: String = reference.chars().filter(|c| !c.is_whitespace()).collect();

    for scope in [&data.recipient, &data.global] {
        if let Some(value) = resolve(scope, &path)? {
            return Ok(value);
        }
    }

    Err(ResolveError::NotFound { path })
}

/// Text substituted for a resolved value
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

struct PathWalker<'a, 'p> {
    root: &'a Value,
    reference: &'p str,
}

impl<'a, 'p> PathWalker<'a, 'p> {
    fn walk(&self, scope: &'a Value, path: &str, depth: usize) -> Result<Option<&'a Value>, ResolveError> {
        if depth > MAX_PATH_DEPTH {
            return Err(ResolveError::PathTooDeep {
                path: self.reference.to_string(),
                max: MAX_PATH_DEPTH,
            });
        }

        let check = validate_name(path);
        if check.is_valid() {
            return Ok(scope.get(path));
        }

        let Some(split) = path.find(['.', '[']) else {
            return Err(self.name_error(path, check));
        };

        let head = &path[..split];
        let head_check = validate_name(head);
        if !head_check.is_valid() {
            return Err(self.name_error(head, head_check));
        }

        if path[split..].starts_with('.') {
            return match scope.get(head) {
                Some(child) => self.walk(child, &path[split + 1..], depth + 1),
                None => Ok(None),
            };
        }

        let open = split + 1;
        let close = matching_bracket(path, open).ok_or_else(|| self.malformed("missing ']'"))?;
        let rest = &path[close + 1..];
        if !rest.is_empty() && !rest.starts_with('.') {
            return Err(self.malformed("index must be followed by '.' or end of path"));
        }

        let Some(index) = self.index(&path[open..close], depth)? else {
            return Ok(None);
        };

        let element = match scope
            .get(head)
            .and_then(Value::as_array)
            .and_then(|items| items.get(index))
        {
            Some(element) => element,
            None => return Ok(None),
        };

        match rest.strip_prefix('.') {
            Some(rest) => self.walk(element, rest, depth + 1),
            None => Ok(Some(element)),
        }
    }

    /// Numeric value of an index expression, or `None` when it does not name one
    fn index(&self, expr: &str, depth: usize) -> Result<Option<usize>, ResolveError> {
        if expr.is_empty() {
            return Err(self.malformed("empty index"));
        }

        if expr.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(expr.parse().ok());
        }

        let value = self.walk(self.root, expr, depth + 1)?;
        Ok(value.and_then(index_from_value))
    }

    fn name_error(&self, name: &str, check: NameCheck) -> ResolveError {
        match check {
            NameCheck::Reserved => ResolveError::ReservedName {
                name: name.to_string(),
                path: self.reference.to_string(),
            },
            _ => ResolveError::InvalidName {
                name: name.to_string(),
                path: self.reference.to_string(),
            },
        }
    }

    fn malformed(&self, reason: &'static str) -> ResolveError {
        ResolveError::MalformedIndex {
            path: self.reference.to_string(),
            reason,
        }
    }
}

/// Byte offset of the `]` closing the `[` just before `start`
fn matching_bracket(path: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, ch) in path[start..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn index_from_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_dotted_path() {
        let scope = json!({"a": {"b": "x"}});
        assert_eq!(resolve(&scope, "a.b").unwrap(), Some(&json!("x")));
    }

    #[test]
    fn test_indexed_path() {
        let scope = json!({"a": ["p", "q"]});
        assert_eq!(resolve(&scope, "a[0]").unwrap(), Some(&json!("p")));
        assert_eq!(resolve(&scope, "a[1]").unwrap(), Some(&json!("q")));
    }

    #[test]
    fn test_out_of_range_index_is_silent_miss() {
        let scope = json!({"a": ["p", "q"]});
        assert_eq!(resolve(&scope, "a[9]").unwrap(), None);
    }

    #[test]
    fn test_index_then_member() {
        let scope = json!({
            "employees": [
                {"firstName": "John"},
                {"firstName": "Anna"},
                {"firstName": "Peter"}
            ]
        });
        assert_eq!(
            resolve(&scope, "employees[2].firstName").unwrap(),
            Some(&json!("Peter"))
        );
    }

    #[test]
    fn test_variable_index_uses_top_level_scope() {
        let scope = json!({
            "which": 1,
            "outer": {"list": ["zero", "one"], "which": 0}
        });
        // `which` inside the brackets is looked up at the top, not in `outer`
        assert_eq!(resolve(&scope, "outer.list[which]").unwrap(), Some(&json!("one")));
    }

    #[test]
    fn test_nested_index_brackets() {
        let scope = json!({"a": ["x", "y", "z"], "b": [2]});
        assert_eq!(resolve(&scope, "a[b[0]]").unwrap(), Some(&json!("z")));
    }

    #[test]
    fn test_string_digit_index() {
        let scope = json!({"a": ["x", "y"], "i": "1", "bad": "one"});
        assert_eq!(resolve(&scope, "a[i]").unwrap(), Some(&json!("y")));
        assert_eq!(resolve(&scope, "a[bad]").unwrap(), None);
    }

    #[test]
    fn test_missing_close_bracket() {
        let scope = json!({"a": ["x"]});
        assert_matches!(
            resolve(&scope, "a[0"),
            Err(ResolveError::MalformedIndex { reason: "missing ']'", .. })
        );
    }

    #[test]
    fn test_index_must_be_followed_by_dot() {
        let scope = json!({"a": [["x"]]});
        assert_matches!(resolve(&scope, "a[0]x"), Err(ResolveError::MalformedIndex { .. }));
        assert_matches!(resolve(&scope, "a[0][0]"), Err(ResolveError::MalformedIndex { .. }));
    }

    #[test]
    fn test_reserved_and_invalid_names() {
        let scope = json!({"end": 1, "ok": {"if": 2}});
        assert_matches!(resolve(&scope, "end"), Err(ResolveError::ReservedName { .. }));
        assert_matches!(resolve(&scope, "ok.if"), Err(ResolveError::ReservedName { .. }));
        assert_matches!(resolve(&scope, "9lives"), Err(ResolveError::InvalidName { .. }));
        assert_matches!(resolve(&scope, ""), Err(ResolveError::InvalidName { .. }));
        assert_matches!(resolve(&scope, "a-b.c"), Err(ResolveError::InvalidName { .. }));
    }

    #[test]
    fn test_missing_name_is_silent_miss() {
        let scope = json!({"a": {"b": 1}});
        assert_eq!(resolve(&scope, "nope").unwrap(), None);
        assert_eq!(resolve(&scope, "nope.b").unwrap(), None);
        assert_eq!(resolve(&scope, "a.c").unwrap(), None);
        assert_eq!(resolve(&scope, "a[0]").unwrap(), None);
    }

    #[test]
    fn test_path_limits() {
        let scope = json!({});
        let long = "a".repeat(MAX_PATH_LENGTH + 1);
        assert_matches!(resolve(&scope, &long), Err(ResolveError::PathTooLong { .. }));

        let mut deep = json!("leaf");
        for _ in 0..MAX_PATH_DEPTH + 2 {
            deep = json!({ "n": deep });
        }
        let path = vec!["n"; MAX_PATH_DEPTH + 2].join(".");
        assert_matches!(resolve(&deep, &path), Err(ResolveError::PathTooDeep { .. }));

        let within = vec!["n"; MAX_PATH_DEPTH + 1].join(".");
        assert!(resolve(&deep, &within).unwrap().is_some());
    }

    #[test]
    fn test_recipient_shadows_global() {
        let data = SubstitutionData::new(json!({"id": "125"}), json!({"id": "999", "only": "g"}));
        assert_eq!(lookup(&data, "id").unwrap(), &json!("125"));
        assert_eq!(lookup(&data, "only").unwrap(), &json!("g"));
    }

    #[test]
    fn test_lookup_ignores_whitespace_and_reports_miss() {
        let data = SubstitutionData::new(json!({"name": "billybob"}), json!({}));
        assert_eq!(lookup(&data, " name ").unwrap(), &json!("billybob"));
        assert_matches!(
            lookup(&data, "absent"),
            Err(ResolveError::NotFound { path }) if path == "absent"
        );
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(value_to_string(&json!("text")), "text");
        assert_eq!(value_to_string(&json!(42)), "42");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&Value::Null), "");
        assert_eq!(value_to_string(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
    }
}
