// Rate samples -> flat metric mapping

use super::series::series_key;
use std::collections::BTreeMap;

/// Bytes per second for one container over the last interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSample {
    pub name: String,
    pub tx: i64,
    pub rx: i64,
}

pub const SUMMARY_TX_KEY: &str = "network_bytes_tx";
pub const SUMMARY_RX_KEY: &str = "network_bytes_rx";

pub fn metric_key(name: &str, direction: &str) -> String {
    format!("container_{}_network_bytes_{direction}", series_key(name))
}

/// Per-container keys plus summary totals over the same samples. No samples
/// means an empty mapping, summary included.
pub fn emit(samples: &[RateSample]) -> BTreeMap<String, i64> {
    let mut mx = BTreeMap::new();
    if samples.is_empty() {
        return mx;
    }
    let (mut total_tx, mut total_rx) = (0i64, 0i64);
    for s in samples {
        mx.insert(metric_key(&s.name, "tx"), s.tx);
        mx.insert(metric_key(&s.name, "rx"), s.rx);
        total_tx = total_tx.saturating_add(s.tx);
        total_rx = total_rx.saturating_add(s.rx);
    }
    mx.insert(SUMMARY_TX_KEY.to_string(), total_tx);
    mx.insert(SUMMARY_RX_KEY.to_string(), total_rx);
    mx
}
