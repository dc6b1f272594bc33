// Reference table of v1alpha2 -> v1alpha3 field mappings (list_field_mappings).

use serde_json::{Map as JsonMap, Value};

pub fn list_field_mappings_json() -> String {
    let mappings: JsonMap<String, Value> = default_mappings();
    serde_json::to_string_pretty(&mappings).unwrap_or_else(|_| default_mappings_raw().to_string())
}

fn default_mappings() -> JsonMap<String, Value> {
    serde_json::from_str(default_mappings_raw()).unwrap_or_default()
}

fn default_mappings_raw() -> &'static str {
    r#"{
  "metadata": {
    "rule": "verbatim",
    "fields": ["name", "namespace"],
    "notes": "name is required; labels and annotations are not carried over"
  },
  "spec": {
    "rule": "verbatim",
    "fields": ["version", "imageRegistry", "imagePullPolicy", "imagePullSecrets", "distributionChannel", "deploymentStrategy", "features", "storageClassName", "astarteInstanceID", "manualMaintenanceMode", "rbac", "api.host", "api.sslListener"],
    "dropped": ["api.polling"]
  },
  "cassandra": {
    "rule": "restructure",
    "mappings": {
      "nodes": "connection.nodes (\"host:port,...\" becomes a list of {host, port}, default port 9042)",
      "connection.secret": "connection.credentialsSecret",
      "connection.sslConfiguration": "connection.sslConfiguration",
      "connection.poolSize": "connection.poolSize"
    },
    "dropped": ["deploy", "replicas", "image", "version", "storage", "maxHeapSize", "heapNewSize", "resources", "antiAffinity", "customAffinity", "connection.username", "connection.password"],
    "interactive": "with deploy: true the nodes and the credentials Secret are asked to the operator"
  },
  "rabbitmq": {
    "rule": "rename",
    "mappings": {
      "connection.host": "connection.host",
      "connection.port": "connection.port",
      "connection.virtualHost": "connection.virtualHost",
      "connection.sslConfiguration": "connection.sslConfiguration",
      "connection.secret": "connection.credentialsSecret",
      "dataQueuesPrefix": "dataQueuesPrefix",
      "eventsExchangeName": "eventsExchangeName"
    },
    "dropped": ["deploy", "replicas", "image", "version", "storage", "resources", "antiAffinity", "customAffinity", "additionalPlugins", "connection.username", "connection.password"],
    "interactive": "with deploy: true host, port and the credentials Secret are asked to the operator"
  },
  "vernemq": {
    "rule": "verbatim",
    "dropped": ["deploy"],
    "notes": "the operator keeps deploying VerneMQ"
  },
  "cfssl": {
    "rule": "verbatim",
    "notes": "with deploy: false only url is kept; a missing url is asked to the operator"
  },
  "components": {
    "merged": {
      "rule": "semantic merge",
      "components": ["housekeeping", "realmManagement", "pairing"],
      "notes": "api and backend are unified: resources are summed, additionalEnv merged with backend entries winning, other fields prefer backend"
    },
    "verbatim": ["resources", "dataUpdaterPlant", "appengineApi", "triggerEngine", "dashboard"],
    "dropped": ["flow"]
  }
}"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mappings_reference_is_valid_json() {
        let mappings = default_mappings();
        for section in ["metadata", "spec", "cassandra", "rabbitmq", "vernemq", "cfssl", "components"] {
            assert!(mappings.contains_key(section), "{section}");
        }
        assert!(list_field_mappings_json().contains("credentialsSecret"));
    }
}
