// spec.rabbitmq: connection to an externally managed broker plus queue naming.

use super::diagnostics::Level;
use super::MigrationContext;
use crate::types::DEFAULT_RABBITMQ_PORT;
use serde_json::{Map as JsonMap, Value};

const BASE: [&str; 2] = ["spec", "rabbitmq"];
const CONNECTION: [&str; 3] = ["spec", "rabbitmq", "connection"];

const DEPLOYMENT_FIELDS: [&str; 7] = [
    "replicas",
    "image",
    "version",
    "storage",
    "resources",
    "antiAffinity",
    "customAffinity",
];

const CONNECTION_FIELDS: [&str; 4] = ["host", "port", "virtualHost", "sslConfiguration"];

const MESSAGING_FIELDS: [&str; 2] = ["dataQueuesPrefix", "eventsExchangeName"];

fn ask_connection(ctx: &mut MigrationContext<'_>, connection: &mut JsonMap<String, Value>) {
    ctx.ask_into(
        "spec.rabbitmq.connection.host",
        "RabbitMQ host",
        connection,
        &["host"],
    );
    ctx.ask_port(
        "spec.rabbitmq.connection.port",
        &format!("RabbitMQ AMQP port (usually {DEFAULT_RABBITMQ_PORT})"),
        connection,
        &["port"],
    );
    ctx.ask_credentials_secret(&BASE, "RabbitMQ", connection);
}

pub fn convert_rabbitmq(ctx: &mut MigrationContext<'_>) -> JsonMap<String, Value> {
    let mut out = JsonMap::new();
    if ctx.section(&BASE).is_none() {
        ctx.diagnostics.warn(
            "spec.rabbitmq",
            "missing; v1alpha3 requires connection details for an external RabbitMQ",
        );
        return out;
    }

    let mut connection = JsonMap::new();
    let has_connection = ctx.section(&CONNECTION).is_some();
    if has_connection {
        ctx.convert_credentials(&BASE, "RabbitMQ", &mut connection);
    }

    if ctx.is_deployed(&BASE) {
        ctx.diagnostics.error(
            "spec.rabbitmq.deploy",
            "RabbitMQ is no longer deployed by the operator: deploy it yourself and \
             provide its connection details",
        );
        ctx.report_dropped(
            &BASE,
            &DEPLOYMENT_FIELDS,
            Level::Warn,
            "RabbitMQ deployment settings are not supported anymore",
        );
        ctx.report_dropped(
            &BASE,
            &["additionalPlugins"],
            Level::Warn,
            "enable the plugins on your own RabbitMQ deployment",
        );
        if has_connection {
            ctx.report_dropped(
                &CONNECTION,
                &["host", "port"],
                Level::Warn,
                "pointed at the operator-managed RabbitMQ",
            );
            ctx.copy_fields(&CONNECTION, &["virtualHost", "sslConfiguration"], &mut connection);
        }
        ask_connection(ctx, &mut connection);
    } else {
        ctx.report_dropped(&BASE, &DEPLOYMENT_FIELDS, Level::Info, "ignored when deploy is false");
        if has_connection {
            ctx.copy_fields(&CONNECTION, &CONNECTION_FIELDS, &mut connection);
        }
        if !connection.contains_key("host") {
            ctx.diagnostics.warn(
                "spec.rabbitmq.connection.host",
                "missing; set it to your RabbitMQ host",
            );
        }
    }

    if !connection.is_empty() {
        out.insert("connection".to_string(), Value::Object(connection));
    }
    ctx.copy_fields(&BASE, &MESSAGING_FIELDS, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::diagnostics::Diagnostics;
    use crate::migration::operator::testing::CannedOperator;
    use crate::migration::operator::{NonInteractive, OperatorInput};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(rabbitmq: Value, op: &mut dyn OperatorInput) -> (Value, Diagnostics) {
        let source = json!({"spec": {"rabbitmq": rabbitmq}});
        let mut ctx = MigrationContext::new(&source, op);
        let out = convert_rabbitmq(&mut ctx);
        (Value::Object(out), ctx.diagnostics)
    }

    #[test]
    fn test_external_rabbitmq() {
        let (out, diags) = run(
            json!({
                "connection": {
                    "host": "rabbit.example.com",
                    "port": 5671,
                    "virtualHost": "/",
                    "username": "guest",
                    "secret": {"name": "rabbit", "usernameKey": "u", "passwordKey": "p"},
                    "sslConfiguration": {"enabled": true}
                },
                "dataQueuesPrefix": "astarte_data_",
                "eventsExchangeName": ""
            }),
            &mut NonInteractive,
        );
        assert_eq!(
            out,
            json!({
                "connection": {
                    "host": "rabbit.example.com",
                    "port": 5671,
                    "virtualHost": "/",
                    "sslConfiguration": {"enabled": true},
                    "credentialsSecret": {"name": "rabbit", "usernameKey": "u", "passwordKey": "p"}
                },
                "dataQueuesPrefix": "astarte_data_"
            })
        );
        assert!(diags.iter().any(|d| d.path == "spec.rabbitmq.connection.username"));
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_deployed_rabbitmq_asks_operator() {
        let mut op = CannedOperator::new(["rabbit", "5672", "rabbit-creds", "user", "pass"]);
        let (out, diags) = run(
            json!({"deploy": true, "additionalPlugins": ["rabbitmq_shovel"], "connection": {"virtualHost": "/astarte"}}),
            &mut op,
        );
        assert_eq!(
            out,
            json!({"connection": {
                "virtualHost": "/astarte",
                "host": "rabbit",
                "port": 5672,
                "credentialsSecret": {"name": "rabbit-creds", "usernameKey": "user", "passwordKey": "pass"}
            }})
        );
        assert!(diags.iter().any(|d| d.path == "spec.rabbitmq.additionalPlugins"));
    }

    #[test]
    fn test_invalid_port_answer_is_left_unset() {
        let mut op = CannedOperator::new(["rabbit", "amqp", "", "", ""]);
        let (out, diags) = run(json!({"deploy": true}), &mut op);
        assert_eq!(out, json!({"connection": {"host": "rabbit"}}));
        assert!(diags.iter().any(|d| d.path == "spec.rabbitmq.connection.port" && d.level == Level::Error));
        assert!(diags.iter().any(|d| d.path == "spec.rabbitmq.connection.credentialsSecret.name" && d.level == Level::Warn));
    }

    #[test]
    fn test_deployed_rabbitmq_reports_stale_host() {
        let mut op = CannedOperator::new(["", "", "", "", ""]);
        let (out, diags) = run(
            json!({"deploy": true, "connection": {"host": "rabbit.old", "port": 5671}}),
            &mut op,
        );
        assert_eq!(out, json!({}));
        for field in ["host", "port"] {
            let path = format!("spec.rabbitmq.connection.{field}");
            assert!(diags
                .iter()
                .any(|d| d.path == path && d.level == Level::Warn && d.message.starts_with("dropped")));
        }
    }

    #[test]
    fn test_malformed_connection_is_reported_once() {
        let (out, diags) = run(json!({"connection": "amqp://rabbit"}), &mut NonInteractive);
        assert_eq!(out, json!({}));
        let errors: Vec<&str> = diags
            .iter()
            .filter(|d| d.level == Level::Error)
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(errors, vec!["spec.rabbitmq.connection"]);
    }
}
