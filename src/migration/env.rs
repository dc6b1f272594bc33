// Merge of `additionalEnv` lists (Kubernetes EnvVar entries).

use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvMergeError {
    #[error("{list} entry #{index} has no name")]
    MissingName { list: &'static str, index: usize },

    #[error("{list} defines {name:?} more than once")]
    DuplicateName { list: &'static str, name: String },
}

fn names<'a>(entries: &'a [Value], list: &'static str) -> Result<Vec<&'a str>, EnvMergeError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or(EnvMergeError::MissingName { list, index })?;
        if !seen.insert(name) {
            return Err(EnvMergeError::DuplicateName {
                list,
                name: name.to_string(),
            });
        }
        out.push(name);
    }
    Ok(out)
}

/// Merges two env lists. On a name collision the secondary entry wins; the result
/// holds the primary's remaining entries in order followed by all secondary entries.
pub fn merge_env(primary: &[Value], secondary: &[Value]) -> Result<Vec<Value>, EnvMergeError> {
    let primary_names = names(primary, "primary")?;
    let secondary_names: HashSet<&str> = names(secondary, "secondary")?.into_iter().collect();

    let mut merged: Vec<Value> = primary
        .iter()
        .zip(primary_names)
        .filter(|(_, name)| !secondary_names.contains(name))
        .map(|(entry, _)| entry.clone())
        .collect();
    merged.extend(secondary.iter().cloned());
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list(v: Value) -> Vec<Value> {
        v.as_array().cloned().unwrap()
    }

    #[test]
    fn test_secondary_wins_on_collision() {
        let primary = list(json!([{"name": "A", "value": "1"}]));
        let secondary = list(json!([{"name": "A", "value": "2"}, {"name": "B", "value": "3"}]));
        let merged = merge_env(&primary, &secondary).unwrap();
        assert_eq!(
            Value::Array(merged),
            json!([{"name": "A", "value": "2"}, {"name": "B", "value": "3"}])
        );
    }

    #[test]
    fn test_primary_order_kept_for_distinct_names() {
        let primary = list(json!([
            {"name": "X", "value": "1"},
            {"name": "SHARED", "value": "api"},
            {"name": "Y", "valueFrom": {"secretKeyRef": {"name": "s", "key": "k"}}}
        ]));
        let secondary = list(json!([{"name": "SHARED", "value": "backend"}]));
        let merged = merge_env(&primary, &secondary).unwrap();
        let names: Vec<&str> = merged.iter().map(|e| e["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["X", "Y", "SHARED"]);
        assert_eq!(merged[2]["value"], json!("backend"));
    }

    #[test]
    fn test_empty_lists() {
        assert!(merge_env(&[], &[]).unwrap().is_empty());
        let only = list(json!([{"name": "A", "value": "1"}]));
        assert_eq!(merge_env(&only, &[]).unwrap(), only);
        assert_eq!(merge_env(&[], &only).unwrap(), only);
    }

    #[test]
    fn test_duplicate_name_within_one_list_is_rejected() {
        let primary = list(json!([{"name": "A", "value": "1"}, {"name": "A", "value": "2"}]));
        let err = merge_env(&primary, &[]).unwrap_err();
        assert_eq!(
            err,
            EnvMergeError::DuplicateName {
                list: "primary",
                name: "A".to_string()
            }
        );
    }

    #[test]
    fn test_entry_without_name_is_rejected() {
        let secondary = list(json!([{"value": "1"}]));
        let err = merge_env(&[], &secondary).unwrap_err();
        assert_eq!(
            err,
            EnvMergeError::MissingName {
                list: "secondary",
                index: 0
            }
        );
    }
}
