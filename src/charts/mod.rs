// Chart (series group) declarations consumed by the visualization layer

mod registry;

pub use registry::{ChartRegistry, RegistryError, SeriesRegistry};

use serde::{Deserialize, Serialize};

/// Relative ordering of network charts on the dashboard.
pub const PRIO_NETWORK_BYTES: u32 = 70_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Stacked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dim {
    /// Metric key this dimension plots.
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub id: String,
    pub title: String,
    pub units: String,
    pub fam: String,
    pub ctx: String,
    pub priority: u32,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    pub dims: Vec<Dim>,
}

/// Chart aggregating traffic over every tracked container.
pub fn summary_chart() -> Chart {
    Chart {
        id: "network_bytes".into(),
        title: "Network bytes".into(),
        units: "bytes/s".into(),
        fam: "network".into(),
        ctx: "docker_net.network_bytes".into(),
        priority: PRIO_NETWORK_BYTES,
        chart_type: ChartType::Stacked,
        labels: Vec::new(),
        dims: vec![
            Dim {
                id: "network_bytes_rx".into(),
                name: "received".into(),
            },
            Dim {
                id: "network_bytes_tx".into(),
                name: "sent".into(),
            },
        ],
    }
}

/// Per-container chart. `key` is the sanitized container name, `name` the
/// display name carried as a label.
pub fn container_charts(key: &str, name: &str) -> Vec<Chart> {
    vec![Chart {
        id: format!("network_{key}_bytes"),
        title: "Network bytes".into(),
        units: "bytes/s".into(),
        fam: "network".into(),
        ctx: "docker_net.container_network_bytes".into(),
        priority: PRIO_NETWORK_BYTES,
        chart_type: ChartType::Stacked,
        labels: vec![Label {
            key: "container_name".into(),
            value: name.to_string(),
        }],
        dims: vec![
            Dim {
                id: format!("container_{key}_network_bytes_rx"),
                name: "received".into(),
            },
            Dim {
                id: format!("container_{key}_network_bytes_tx"),
                name: "sent".into(),
            },
        ],
    }]
}
