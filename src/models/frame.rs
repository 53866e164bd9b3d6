// One completed poll, as published to consumers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsFrame {
    /// Unix epoch millis at which the poll finished.
    pub timestamp: u64,
    /// Number of containers in this poll's listing.
    pub containers: usize,
    pub metrics: BTreeMap<String, i64>,
}
