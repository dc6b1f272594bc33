//! `spec.components`: services split into `api` and `backend` halves in v1alpha2 are
//! unified into a single block; the other components keep their shape.

use super::diagnostics::Diagnostics;
use super::env::merge_env;
use super::quantity::merge_resources;
use super::tree::{is_present, kind_of};
use super::MigrationContext;
use crate::types::{MERGED_COMPONENTS, VERBATIM_COMPONENTS};
use serde_json::{Map as JsonMap, Value};

/// Fields of the generic API component.
pub const GENERIC_API_FIELDS: [&str; 13] = [
    "deploy",
    "replicas",
    "antiAffinity",
    "customAffinity",
    "deploymentStrategy",
    "version",
    "image",
    "resources",
    "additionalEnv",
    "podLabels",
    "autoscaler",
    "priorityClass",
    "disableAuthentication",
];

/// Fields of the generic clustered resource used for backends.
pub const GENERIC_BACKEND_FIELDS: [&str; 12] = [
    "deploy",
    "replicas",
    "antiAffinity",
    "customAffinity",
    "deploymentStrategy",
    "version",
    "image",
    "resources",
    "additionalEnv",
    "podLabels",
    "autoscaler",
    "priorityClass",
];

fn union_fields() -> Vec<&'static str> {
    let mut fields = GENERIC_API_FIELDS.to_vec();
    for field in GENERIC_BACKEND_FIELDS {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    fields
}

fn half<'v>(value: Option<&'v Value>, path: &str, diags: &mut Diagnostics) -> Option<&'v JsonMap<String, Value>> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            diags.error(path, format!("expected a map, found {}; ignored", kind_of(other)));
            None
        }
    }
}

fn env_list<'v>(value: Option<&'v Value>, path: &str, diags: &mut Diagnostics) -> &'v [Value] {
    match value {
        Some(Value::Array(list)) => list,
        None | Some(Value::Null) => &[],
        Some(other) => {
            diags.error(path, format!("expected a list, found {}; ignored", kind_of(other)));
            &[]
        }
    }
}

fn present<'v>(map: &'v JsonMap<String, Value>, key: &str) -> Option<&'v Value> {
    map.get(key).filter(|v| is_present(v))
}

/// Unifies the `api` and `backend` halves of a component.
///
/// With one half present it is copied as is. With both, `resources` are summed,
/// `additionalEnv` lists are merged with backend entries winning, and every other
/// field takes the backend value when set and the api value otherwise.
pub fn merge_component(
    api: Option<&Value>,
    backend: Option<&Value>,
    path: &str,
    diags: &mut Diagnostics,
) -> JsonMap<String, Value> {
    let api = half(api, &format!("{path}.api"), diags);
    let backend = half(backend, &format!("{path}.backend"), diags);

    let (api, backend) = match (api, backend) {
        (None, None) => {
            diags.warn(path, "neither api nor backend is set; component left empty");
            return JsonMap::new();
        }
        (Some(only), None) | (None, Some(only)) => return only.clone(),
        (Some(api), Some(backend)) => (api, backend),
    };

    let fields = union_fields();
    for (side, map) in [("api", api), ("backend", backend)] {
        for key in map.keys() {
            if !fields.contains(&key.as_str()) {
                diags.warn(
                    format!("{path}.{side}.{key}"),
                    "not a generic component field; dropped",
                );
            }
        }
    }

    let mut out = JsonMap::new();
    for field in fields {
        let field_path = format!("{path}.{field}");
        let merged = match field {
            "resources" => {
                let summed = merge_resources(
                    api.get(field),
                    backend.get(field),
                    &field_path,
                    diags,
                );
                (!summed.is_empty()).then_some(Value::Object(summed))
            }
            "additionalEnv" => {
                let primary = env_list(api.get(field), &format!("{path}.api.{field}"), diags);
                let secondary =
                    env_list(backend.get(field), &format!("{path}.backend.{field}"), diags);
                match merge_env(primary, secondary) {
                    Ok(list) if list.is_empty() => None,
                    Ok(list) => Some(Value::Array(list)),
                    Err(e) => {
                        diags.error(
                            &field_path,
                            format!("{e}; additionalEnv omitted, fix the source and rerun"),
                        );
                        None
                    }
                }
            }
            _ => present(backend, field).or_else(|| present(api, field)).cloned(),
        };
        if let Some(value) = merged {
            out.insert(field.to_string(), value);
        }
    }
    out
}

pub fn convert_components(ctx: &mut MigrationContext<'_>) -> JsonMap<String, Value> {
    let mut out = JsonMap::new();
    let Some(source) = ctx.section(&["spec", "components"]) else {
        ctx.diagnostics
            .warn("spec.components", "missing; all components use operator defaults");
        return out;
    };

    ctx.copy(&["spec", "components", "resources"], &mut out, &["resources"]);

    for name in MERGED_COMPONENTS {
        let path = format!("spec.components.{name}");
        let Some(component) = ctx.section(&["spec", "components", name]) else {
            continue;
        };
        let merged = merge_component(
            component.get("api"),
            component.get("backend"),
            &path,
            &mut ctx.diagnostics,
        );
        for key in component.keys() {
            if key != "api" && key != "backend" {
                ctx.diagnostics
                    .warn(format!("{path}.{key}"), "expected only api and backend; dropped");
            }
        }
        if !merged.is_empty() {
            out.insert(name.to_string(), Value::Object(merged));
        }
    }

    for name in VERBATIM_COMPONENTS {
        ctx.copy(&["spec", "components", name], &mut out, &[name]);
    }

    if ctx.present(&["spec", "components", "flow"]).is_some() {
        ctx.diagnostics.warn(
            "spec.components.flow",
            "Astarte Flow is no longer managed by the operator; dropped",
        );
    }

    for key in source.keys() {
        let known = key == "resources"
            || key == "flow"
            || MERGED_COMPONENTS.contains(&key.as_str())
            || VERBATIM_COMPONENTS.contains(&key.as_str());
        if !known {
            ctx.diagnostics.warn(
                format!("spec.components.{key}"),
                "unknown component; not carried over",
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::operator::NonInteractive;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_only_api_half_is_copied_verbatim() {
        let api = json!({"replicas": 2, "podLabels": {"tier": "api"}, "disableAuthentication": true});
        let mut diags = Diagnostics::new();
        let mut merged = merge_component(Some(&api), None, "hk", &mut diags);
        assert_eq!(Value::Object(merged.clone()), api);
        assert!(diags.is_empty());

        merged["podLabels"]["tier"] = json!("changed");
        assert_eq!(api["podLabels"]["tier"], json!("api"));
    }

    #[test]
    fn test_null_half_counts_as_absent() {
        let backend = json!({"replicas": 1});
        let mut diags = Diagnostics::new();
        let merged = merge_component(Some(&Value::Null), Some(&backend), "hk", &mut diags);
        assert_eq!(Value::Object(merged), backend);
    }

    #[test]
    fn test_neither_half_warns() {
        let mut diags = Diagnostics::new();
        assert!(merge_component(None, None, "hk", &mut diags).is_empty());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_both_halves_merge() {
        let api = json!({
            "replicas": 2,
            "image": "astarte/housekeeping_api:1.1",
            "disableAuthentication": false,
            "version": "",
            "resources": {"requests": {"cpu": "100m", "memory": "256Mi"}},
            "additionalEnv": [{"name": "A", "value": "1"}, {"name": "LOG", "value": "debug"}]
        });
        let backend = json!({
            "replicas": null,
            "image": "astarte/housekeeping:1.1",
            "version": "1.1.0",
            "resources": {"requests": {"cpu": "200m"}, "limits": {"memory": "1Gi"}},
            "additionalEnv": [{"name": "A", "value": "2"}, {"name": "B", "value": "3"}]
        });
        let mut diags = Diagnostics::new();
        let merged = merge_component(Some(&api), Some(&backend), "hk", &mut diags);
        assert_eq!(
            Value::Object(merged),
            json!({
                "replicas": 2,
                "version": "1.1.0",
                "image": "astarte/housekeeping:1.1",
                "resources": {
                    "requests": {"cpu": "300m", "memory": "256Mi"},
                    "limits": {"memory": "1Gi"}
                },
                "additionalEnv": [
                    {"name": "LOG", "value": "debug"},
                    {"name": "A", "value": "2"},
                    {"name": "B", "value": "3"}
                ],
                "disableAuthentication": false
            })
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_duplicate_env_names_omit_field() {
        let api = json!({"additionalEnv": [{"name": "A", "value": "1"}, {"name": "A", "value": "2"}]});
        let backend = json!({"replicas": 1});
        let mut diags = Diagnostics::new();
        let merged = merge_component(Some(&api), Some(&backend), "hk", &mut diags);
        assert_eq!(Value::Object(merged), json!({"replicas": 1}));
        assert!(diags.has_errors());
    }

    #[test]
    fn test_unknown_fields_are_reported() {
        let api = json!({"replicas": 1, "legacyFlag": true});
        let backend = json!({"replicas": 3});
        let mut diags = Diagnostics::new();
        let merged = merge_component(Some(&api), Some(&backend), "hk", &mut diags);
        assert_eq!(Value::Object(merged), json!({"replicas": 3}));
        assert_eq!(diags.iter().next().map(|d| d.path.as_str()), Some("hk.api.legacyFlag"));
    }

    #[test]
    fn test_convert_components() {
        let source = json!({"spec": {"components": {
            "resources": {"requests": {"cpu": "2"}},
            "housekeeping": {"api": {"replicas": 1}, "backend": {"replicas": 2}},
            "pairing": {"api": null, "backend": null},
            "realmManagement": {"backend": {"image": "rm"}},
            "dataUpdaterPlant": {"prefetchCount": 300, "dataQueueCount": 128},
            "dashboard": {"deploy": false},
            "flow": {"deploy": true},
            "unknownThing": {}
        }}});
        let mut op = NonInteractive;
        let mut ctx = MigrationContext::new(&source, &mut op);
        let out = convert_components(&mut ctx);
        assert_eq!(
            Value::Object(out),
            json!({
                "resources": {"requests": {"cpu": "2"}},
                "housekeeping": {"replicas": 2},
                "realmManagement": {"image": "rm"},
                "dataUpdaterPlant": {"prefetchCount": 300, "dataQueueCount": 128},
                "dashboard": {"deploy": false}
            })
        );
        let paths: Vec<&str> = ctx.diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"spec.components.pairing"));
        assert!(paths.contains(&"spec.components.flow"));
        assert!(paths.contains(&"spec.components.unknownThing"));
    }
}
