// spec.cassandra: the operator no longer deploys Cassandra, only connects to it.

use super::diagnostics::Level;
use super::nodes::{nodes_to_value, parse_legacy_nodes};
use super::tree::kind_of;
use super::MigrationContext;
use crate::types::DEFAULT_CASSANDRA_PORT;
use serde_json::{Map as JsonMap, Value};

const BASE: [&str; 2] = ["spec", "cassandra"];
const CONNECTION: [&str; 3] = ["spec", "cassandra", "connection"];

/// Settings that only made sense while the operator ran Cassandra itself.
const DEPLOYMENT_FIELDS: [&str; 9] = [
    "replicas",
    "image",
    "version",
    "storage",
    "maxHeapSize",
    "heapNewSize",
    "resources",
    "antiAffinity",
    "customAffinity",
];

const CONNECTION_FIELDS: [&str; 2] = ["sslConfiguration", "poolSize"];

fn store_nodes(ctx: &mut MigrationContext<'_>, raw: &str, path: &str, connection: &mut JsonMap<String, Value>) {
    let (nodes, rejected) = parse_legacy_nodes(raw, DEFAULT_CASSANDRA_PORT);
    for entry in rejected {
        ctx.diagnostics
            .warn(path, format!("skipping node {entry:?}: port is not a number"));
    }
    if nodes.is_empty() {
        ctx.diagnostics.warn(path, "no usable node; connection.nodes left unset");
        return;
    }
    match nodes_to_value(&nodes) {
        Ok(value) => {
            connection.insert("nodes".to_string(), value);
        }
        Err(e) => ctx.diagnostics.error(path, format!("cannot encode nodes: {e}")),
    }
}

fn convert_nodes(ctx: &mut MigrationContext<'_>, connection: &mut JsonMap<String, Value>) {
    let path = "spec.cassandra.nodes";
    match ctx.present(&["spec", "cassandra", "nodes"]) {
        None => ctx
            .diagnostics
            .warn(path, "missing; set connection.nodes to your Cassandra nodes"),
        Some(Value::String(raw)) => store_nodes(ctx, raw, path, connection),
        Some(Value::Array(list)) => {
            ctx.diagnostics.info(path, "already a list; copied as is");
            connection.insert("nodes".to_string(), Value::Array(list.clone()));
        }
        Some(other) => ctx.diagnostics.error(
            path,
            format!("expected a host:port list, found {}", kind_of(other)),
        ),
    }
}

fn ask_connection(ctx: &mut MigrationContext<'_>, connection: &mut JsonMap<String, Value>) {
    let path = "spec.cassandra.connection.nodes";
    if let Some(raw) = ctx.ask(path, "Cassandra nodes (host:port, comma separated)") {
        store_nodes(ctx, &raw, path, connection);
    }
    ctx.ask_credentials_secret(&BASE, "Cassandra", connection);
}

pub fn convert_cassandra(ctx: &mut MigrationContext<'_>) -> JsonMap<String, Value> {
    let mut out = JsonMap::new();
    if ctx.section(&BASE).is_none() {
        ctx.diagnostics.warn(
            "spec.cassandra",
            "missing; v1alpha3 requires connection details for an external Cassandra",
        );
        return out;
    }

    let mut connection = JsonMap::new();
    if ctx.section(&CONNECTION).is_some() {
        ctx.copy_fields(&CONNECTION, &CONNECTION_FIELDS, &mut connection);
        ctx.convert_credentials(&BASE, "Cassandra", &mut connection);
    }

    if ctx.is_deployed(&BASE) {
        ctx.diagnostics.error(
            "spec.cassandra.deploy",
            "Cassandra is no longer deployed by the operator: deploy it yourself and \
             provide its connection details",
        );
        ctx.report_dropped(
            &BASE,
            &DEPLOYMENT_FIELDS,
            Level::Warn,
            "Cassandra deployment settings are not supported anymore",
        );
        ctx.report_dropped(&BASE, &["nodes"], Level::Warn, "pointed at the operator-managed Cassandra");
        ask_connection(ctx, &mut connection);
    } else {
        ctx.report_dropped(&BASE, &DEPLOYMENT_FIELDS, Level::Info, "ignored when deploy is false");
        convert_nodes(ctx, &mut connection);
    }

    if !connection.is_empty() {
        out.insert("connection".to_string(), Value::Object(connection));
    }
    out
}
