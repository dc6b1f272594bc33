// Path-based access into untyped YAML/JSON trees.

use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

/// Failure while walking a tree by key path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The root handed to an accessor is not an object.
    #[error("document root is {found}, expected a map")]
    NotAnObject { found: &'static str },

    /// An intermediate node exists but cannot be descended into.
    #[error("{path} is {found}, expected a map")]
    TypeMismatch { path: String, found: &'static str },
}

pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

pub fn join(path: &[&str]) -> String {
    path.join(".")
}

/// `base` extended with `keys`.
pub fn child<'p>(base: &[&'p str], keys: &[&'p str]) -> Vec<&'p str> {
    base.iter().chain(keys).copied().collect()
}

/// A value counts as present when it is neither null nor the empty string.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Looks up `path` under `doc`.
///
/// Missing keys and null intermediates yield `Ok(None)`. A non-map root or a non-map
/// intermediate value is an error.
pub fn get<'a>(doc: &'a Value, path: &[&str]) -> Result<Option<&'a Value>, AccessError> {
    let Value::Object(root) = doc else {
        return Err(AccessError::NotAnObject {
            found: kind_of(doc),
        });
    };
    let Some((last, parents)) = path.split_last() else {
        return Ok(Some(doc));
    };

    let mut current = root;
    for (depth, key) in parents.iter().enumerate() {
        match current.get(*key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(next)) => current = next,
            Some(other) => {
                return Err(AccessError::TypeMismatch {
                    path: join(&path[..=depth]),
                    found: kind_of(other),
                })
            }
        }
    }
    Ok(current.get(*last))
}

/// Writes `value` at `path`, creating intermediate maps on the way.
pub fn set(dest: &mut JsonMap<String, Value>, path: &[&str], value: Value) -> Result<(), AccessError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };

    let mut current = dest;
    for (depth, key) in parents.iter().enumerate() {
        let slot = current
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(JsonMap::new()));
        if slot.is_null() {
            *slot = Value::Object(JsonMap::new());
        }
        current = match slot {
            Value::Object(next) => next,
            other => {
                return Err(AccessError::TypeMismatch {
                    path: join(&path[..=depth]),
                    found: kind_of(other),
                })
            }
        };
    }
    current.insert((*last).to_string(), value);
    Ok(())
}

/// Writes `value` at `path` only when it is present. Returns whether a write happened.
pub fn set_if_present(
    dest: &mut JsonMap<String, Value>,
    path: &[&str],
    value: Option<Value>,
) -> Result<bool, AccessError> {
    match value {
        Some(v) if is_present(&v) => set(dest, path, v).map(|()| true),
        _ => Ok(false),
    }
}

/// Copies `source[src_path]` to `dest[dest_path]` if found, non-null and not an empty string.
pub fn copy_if_present(
    source: &Value,
    src_path: &[&str],
    dest: &mut JsonMap<String, Value>,
    dest_path: &[&str],
) -> Result<bool, AccessError> {
    let value = get(source, src_path)?.cloned();
    set_if_present(dest, dest_path, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested_value() {
        let doc = json!({"spec": {"cassandra": {"nodes": "a:1"}}});
        assert_eq!(
            get(&doc, &["spec", "cassandra", "nodes"]).unwrap(),
            Some(&json!("a:1"))
        );
    }

    #[test]
    fn test_get_missing_or_null_intermediate_is_not_found() {
        let doc = json!({"spec": {"cassandra": null}});
        assert_eq!(get(&doc, &["spec", "rabbitmq", "deploy"]).unwrap(), None);
        assert_eq!(get(&doc, &["spec", "cassandra", "nodes"]).unwrap(), None);
    }

    #[test]
    fn test_get_type_mismatch_mid_path() {
        let doc = json!({"spec": {"cassandra": "oops"}});
        let err = get(&doc, &["spec", "cassandra", "nodes"]).unwrap_err();
        assert_eq!(
            err,
            AccessError::TypeMismatch {
                path: "spec.cassandra".to_string(),
                found: "a string"
            }
        );
    }

    #[test]
    fn test_get_on_null_root_fails() {
        let err = get(&Value::Null, &["spec"]).unwrap_err();
        assert!(matches!(err, AccessError::NotAnObject { found: "null" }));
    }

    #[test]
    fn test_set_creates_intermediate_maps() {
        let mut dest = JsonMap::new();
        set(&mut dest, &["connection", "credentialsSecret", "name"], json!("cass")).unwrap();
        assert_eq!(
            Value::Object(dest),
            json!({"connection": {"credentialsSecret": {"name": "cass"}}})
        );
    }

    #[test]
    fn test_copy_if_present_skips_null_and_empty_string() {
        let source = json!({"a": null, "b": "", "c": "x", "d": false, "e": 0});
        let mut dest = JsonMap::new();
        assert!(!copy_if_present(&source, &["a"], &mut dest, &["a"]).unwrap());
        assert!(!copy_if_present(&source, &["b"], &mut dest, &["b"]).unwrap());
        assert!(!copy_if_present(&source, &["missing"], &mut dest, &["m"]).unwrap());
        assert!(copy_if_present(&source, &["c"], &mut dest, &["renamed", "c"]).unwrap());
        assert!(copy_if_present(&source, &["d"], &mut dest, &["d"]).unwrap());
        assert!(copy_if_present(&source, &["e"], &mut dest, &["e"]).unwrap());
        assert_eq!(
            Value::Object(dest),
            json!({"renamed": {"c": "x"}, "d": false, "e": 0})
        );
    }

    #[test]
    fn test_copy_is_independent_of_source() {
        let source = json!({"podLabels": {"app": "hk"}});
        let mut dest = JsonMap::new();
        copy_if_present(&source, &["podLabels"], &mut dest, &["podLabels"]).unwrap();
        dest["podLabels"]["app"] = json!("changed");
        assert_eq!(source["podLabels"]["app"], json!("hk"));
    }
}
