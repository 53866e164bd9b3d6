// Container identity and cumulative network counters

use serde::{Deserialize, Serialize};

/// A running container as reported by the runtime listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRef {
    /// Runtime-assigned identifier; stable for the container's lifetime.
    pub id: String,
    /// Display name used as the externally visible series key.
    pub name: String,
}

impl ContainerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Build from the runtime's id and name list. Docker prefixes names with `/`;
    /// a container without names falls back to its id.
    pub fn from_runtime(id: &str, names: Option<&[String]>) -> Self {
        let name = names
            .and_then(|n| n.first())
            .map(|n| n.trim_start_matches('/'))
            .filter(|n| !n.is_empty())
            .unwrap_or(id);
        Self::new(id, name)
    }
}

/// Cumulative transmit/receive byte counters summed over all interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetCounters {
    pub tx_bytes: u64,
    pub rx_bytes: u64,
}

impl NetCounters {
    pub fn new(tx_bytes: u64, rx_bytes: u64) -> Self {
        Self { tx_bytes, rx_bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_runtime_strips_leading_slash() {
        let names = vec!["/web".to_string(), "/alias".to_string()];
        let c = ContainerRef::from_runtime("abc123", Some(names.as_slice()));
        assert_eq!(c, ContainerRef::new("abc123", "web"));
    }

    #[test]
    fn from_runtime_falls_back_to_id() {
        assert_eq!(ContainerRef::from_runtime("abc123", None).name, "abc123");
        let empty = vec!["/".to_string()];
        assert_eq!(
            ContainerRef::from_runtime("abc123", Some(empty.as_slice())).name,
            "abc123"
        );
    }
}
