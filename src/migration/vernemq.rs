// spec.vernemq: still deployed by the operator, same shape in both versions.

use super::MigrationContext;
use serde_json::{Map as JsonMap, Value};

const BASE: [&str; 2] = ["spec", "vernemq"];

const FIELDS: [&str; 21] = [
    "host",
    "port",
    "caSecret",
    "replicas",
    "image",
    "version",
    "resources",
    "storage",
    "antiAffinity",
    "customAffinity",
    "additionalEnv",
    "podLabels",
    "deploymentStrategy",
    "priorityClass",
    "sslListener",
    "sslListenerCertSecretName",
    "deviceHeartbeatSeconds",
    "maxOfflineMessages",
    "persistentClientExpiration",
    "mirrorQueue",
    "autoscaler",
];

pub fn convert_vernemq(ctx: &mut MigrationContext<'_>) -> JsonMap<String, Value> {
    let mut out = JsonMap::new();
    let Some(source) = ctx.section(&BASE) else {
        return out;
    };

    if matches!(source.get("deploy"), Some(Value::Bool(false))) {
        ctx.diagnostics.warn(
            "spec.vernemq.deploy",
            "an external VerneMQ is not supported anymore; the operator will deploy one",
        );
    }
    ctx.copy_fields(&BASE, &FIELDS, &mut out);

    for key in source.keys() {
        if key != "deploy" && !FIELDS.contains(&key.as_str()) {
            ctx.diagnostics
                .warn(format!("spec.vernemq.{key}"), "unknown field; not carried over");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::operator::NonInteractive;
    use serde_json::json;

    #[test]
    fn test_vernemq_fields_are_copied() {
        let source = json!({"spec": {"vernemq": {
            "deploy": false,
            "host": "broker.example.com",
            "port": 8883,
            "sslListener": true,
            "maxOfflineMessages": 1000,
            "mirrorQueue": "",
            "autoscaler": {"horizontal": "vernemq-hpa"},
            "typo": 1
        }}});
        let mut op = NonInteractive;
        let mut ctx = MigrationContext::new(&source, &mut op);
        let out = convert_vernemq(&mut ctx);
        assert_eq!(
            Value::Object(out),
            json!({
                "host": "broker.example.com",
                "port": 8883,
                "sslListener": true,
                "maxOfflineMessages": 1000,
                "autoscaler": {"horizontal": "vernemq-hpa"}
            })
        );
        let paths: Vec<&str> = ctx.diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["spec.vernemq.deploy", "spec.vernemq.typo"]);
    }

    #[test]
    fn test_missing_vernemq_is_silent() {
        let source = json!({"spec": {}});
        let mut op = NonInteractive;
        let mut ctx = MigrationContext::new(&source, &mut op);
        assert!(convert_vernemq(&mut ctx).is_empty());
        assert!(ctx.diagnostics.is_empty());
    }
}
