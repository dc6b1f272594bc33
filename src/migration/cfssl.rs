// spec.cfssl: the certificate authority issuing device certificates.

use super::diagnostics::Level;
use super::MigrationContext;
use serde_json::{Map as JsonMap, Value};

const BASE: [&str; 2] = ["spec", "cfssl"];

const DEPLOYMENT_FIELDS: [&str; 14] = [
    "url",
    "caExpiry",
    "caSecret",
    "certificateExpiry",
    "dbConfig",
    "csrRootCa",
    "caRootConfig",
    "replicas",
    "image",
    "version",
    "resources",
    "storage",
    "podLabels",
    "priorityClass",
];

pub fn convert_cfssl(ctx: &mut MigrationContext<'_>) -> JsonMap<String, Value> {
    let mut out = JsonMap::new();
    if ctx.section(&BASE).is_none() {
        return out;
    }

    if matches!(ctx.lookup(&["spec", "cfssl", "deploy"]), Some(Value::Bool(false))) {
        out.insert("deploy".to_string(), Value::Bool(false));
        if !ctx.copy(&["spec", "cfssl", "url"], &mut out, &["url"]) {
            ctx.diagnostics.warn(
                "spec.cfssl.url",
                "CFSSL is not deployed by the operator but no url is set",
            );
            ctx.ask_into("spec.cfssl.url", "URL of your CFSSL instance", &mut out, &["url"]);
        }
        ctx.report_dropped(
            &BASE,
            &DEPLOYMENT_FIELDS[1..],
            Level::Warn,
            "CFSSL is external; deployment settings are ignored",
        );
        return out;
    }

    ctx.copy(&["spec", "cfssl", "deploy"], &mut out, &["deploy"]);
    ctx.copy_fields(&BASE, &DEPLOYMENT_FIELDS, &mut out);
    out
}
