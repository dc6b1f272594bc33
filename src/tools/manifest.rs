// Validate migrated Astarte manifests.

use crate::types::{ParsedAstarte, ParsedService, ASTARTE_KIND, MERGED_COMPONENTS, TARGET_API_VERSION};

fn validate_no_deploy(section: &str, service: &ParsedService, errors: &mut Vec<String>) {
    if service.deploy.is_some() {
        errors.push(format!(
            "spec.{}.deploy is not part of {}",
            section, TARGET_API_VERSION
        ));
    }
}

/// Validates a v1alpha3 Astarte manifest: parsing, apiVersion/kind, metadata.name, and
/// the sections that changed shape during migration.
pub fn validate_astarte_manifest(config_yaml: &str) -> Result<(), Vec<String>> {
    let parsed: ParsedAstarte = serde_yaml::from_str(config_yaml).map_err(|e| {
        vec![format!("YAML parse error: {}", e)]
    })?;

    let mut errors = Vec::new();

    if parsed.api_version.as_deref() != Some(TARGET_API_VERSION) {
        errors.push(format!("apiVersion must be '{}'", TARGET_API_VERSION));
    }
    if parsed.kind.as_deref() != Some(ASTARTE_KIND) {
        errors.push(format!("kind must be '{}'", ASTARTE_KIND));
    }
    let has_name = parsed
        .metadata
        .as_ref()
        .and_then(|m| m.name.as_deref())
        .is_some_and(|n| !n.is_empty());
    if !has_name {
        errors.push("metadata.name is required".to_string());
    }
    let spec = match &parsed.spec {
        Some(s) => s,
        None => {
            errors.push("spec is required".to_string());
            return Err(errors);
        }
    };

    match &spec.cassandra {
        Some(cassandra) => {
            validate_no_deploy("cassandra", cassandra, &mut errors);
            let nodes = cassandra.connection.as_ref().and_then(|c| c.nodes.as_ref());
            match nodes {
                Some(nodes) if !nodes.is_empty() => {
                    for (i, node) in nodes.iter().enumerate() {
                        if node.get("host").and_then(|h| h.as_str()).map_or(true, str::is_empty) {
                            errors.push(format!("spec.cassandra.connection.nodes[{}].host is required", i));
                        }
                        if node.get("port").and_then(|p| p.as_i64()).is_none() {
                            errors.push(format!("spec.cassandra.connection.nodes[{}].port must be a number", i));
                        }
                    }
                }
                _ => errors.push("spec.cassandra.connection.nodes is required".to_string()),
            }
        }
        None => errors.push("spec.cassandra is required".to_string()),
    }

    match &spec.rabbitmq {
        Some(rabbitmq) => {
            validate_no_deploy("rabbitmq", rabbitmq, &mut errors);
            let host = rabbitmq.connection.as_ref().and_then(|c| c.host.as_deref());
            if host.map_or(true, str::is_empty) {
                errors.push("spec.rabbitmq.connection.host is required".to_string());
            }
        }
        None => errors.push("spec.rabbitmq is required".to_string()),
    }

    if let Some(components) = &spec.components {
        for name in MERGED_COMPONENTS {
            let Some(component) = components.get(name) else {
                continue;
            };
            for half in ["api", "backend"] {
                if component.get(half).is_some() {
                    errors.push(format!(
                        "spec.components.{}.{} must be merged into spec.components.{}",
                        name, half, name
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_astarte_manifest_valid() {
        let yaml = r#"
apiVersion: api.astarte-platform.org/v1alpha3
kind: Astarte
metadata:
  name: astarte
spec:
  cassandra:
    connection:
      nodes:
        - host: cassandra-0
          port: 9042
  rabbitmq:
    connection:
      host: rabbitmq
  components:
    housekeeping:
      replicas: 2
"#;
        assert!(validate_astarte_manifest(yaml).is_ok());
    }

    #[test]
    fn test_validate_astarte_manifest_old_shape() {
        let yaml = r#"
apiVersion: api.astarte-platform.org/v1alpha2
kind: Astarte
metadata:
  name: astarte
spec:
  cassandra:
    deploy: true
    nodes: "cassandra-0:9042"
  rabbitmq:
    deploy: true
  components:
    pairing:
      api:
        replicas: 1
"#;
        let errors = validate_astarte_manifest(yaml).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("apiVersion")));
        assert!(errors.iter().any(|e| e == "spec.cassandra.deploy is not part of api.astarte-platform.org/v1alpha3"));
        assert!(errors.iter().any(|e| e.contains("spec.cassandra.connection.nodes")));
        assert!(errors.iter().any(|e| e.contains("spec.rabbitmq.connection.host")));
        assert!(errors.iter().any(|e| e.contains("spec.components.pairing.api")));
    }

    #[test]
    fn test_validate_astarte_manifest_bad_node() {
        let yaml = r#"
apiVersion: api.astarte-platform.org/v1alpha3
kind: Astarte
metadata:
  name: astarte
spec:
  cassandra:
    connection:
      nodes:
        - host: ""
          port: "9042"
  rabbitmq:
    connection:
      host: rabbitmq
"#;
        let errors = validate_astarte_manifest(yaml).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_validate_astarte_manifest_missing_spec() {
        let yaml = r#"
apiVersion: api.astarte-platform.org/v1alpha3
kind: Astarte
metadata:
  name: test
"#;
        let err = validate_astarte_manifest(yaml).unwrap_err();
        assert_eq!(err, vec!["spec is required".to_string()]);
    }
}
