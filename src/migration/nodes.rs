// Legacy `host:port,host:port` strings to structured node lists.

use crate::types::NodeAddress;
use serde_json::Value;

/// Parses a comma separated node string. Entries with a missing port get
/// `default_port`; blank entries and entries with an empty host are skipped.
/// Entries whose port is not a number are returned separately so callers can report them.
pub fn parse_legacy_nodes(raw: &str, default_port: i64) -> (Vec<NodeAddress>, Vec<String>) {
    let mut nodes = Vec::new();
    let mut rejected = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (host, port) = match entry.split_once(':') {
            Some((host, port)) => (host.trim(), port.trim()),
            None => (entry, ""),
        };
        if host.is_empty() {
            continue;
        }
        let port = if port.is_empty() {
            default_port
        } else {
            match port.parse::<i64>() {
                Ok(p) => p,
                Err(_) => {
                    rejected.push(entry.to_string());
                    continue;
                }
            }
        };
        nodes.push(NodeAddress {
            host: host.to_string(),
            port,
        });
    }
    (nodes, rejected)
}

pub fn nodes_to_value(nodes: &[NodeAddress]) -> Result<Value, serde_json::Error> {
    serde_json::to_value(nodes)
}
