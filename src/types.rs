// Schema constants and the minimal typed view used to validate converted resources.
// Conversion itself works on serde_json::Value trees.

use serde::{Deserialize, Serialize};

pub const ASTARTE_KIND: &str = "Astarte";
pub const SOURCE_API_VERSION: &str = "api.astarte-platform.org/v1alpha2";
pub const TARGET_API_VERSION: &str = "api.astarte-platform.org/v1alpha3";

pub const DEFAULT_CASSANDRA_PORT: i64 = 9042;
pub const DEFAULT_RABBITMQ_PORT: i64 = 5672;

/// Components split into `api` and `backend` halves in v1alpha2.
pub const MERGED_COMPONENTS: [&str; 3] = ["housekeeping", "realmManagement", "pairing"];

/// Components whose shape did not change.
pub const VERBATIM_COMPONENTS: [&str; 4] =
    ["dataUpdaterPlant", "appengineApi", "triggerEngine", "dashboard"];

/// A `host:port` pair in `cassandra.connection.nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    pub host: String,
    pub port: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedAstarte {
    #[serde(rename = "apiVersion")]
    pub api_version: Option<String>,
    pub kind: Option<String>,
    pub metadata: Option<ParsedMetadata>,
    pub spec: Option<ParsedSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedMetadata {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedSpec {
    pub cassandra: Option<ParsedService>,
    pub rabbitmq: Option<ParsedService>,
    pub components: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Cassandra or RabbitMQ section of a converted resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedService {
    pub deploy: Option<serde_json::Value>,
    pub connection: Option<ParsedConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedConnection {
    pub host: Option<String>,
    pub nodes: Option<Vec<serde_json::Value>>,
}
