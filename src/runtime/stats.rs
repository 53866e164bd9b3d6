// Reduce a raw Docker stats document to cumulative network counters.

use crate::models::NetCounters;
use bollard::models::ContainerStatsResponse;

/// Sum transmit/receive bytes across every interface in the stats document.
/// A container without networks (e.g. `--network none`) reports zero.
pub(crate) fn network_counters(s: &ContainerStatsResponse) -> NetCounters {
    s.networks
        .as_ref()
        .map_or_else(NetCounters::default, |n| {
            n.values().fold(NetCounters::default(), |acc, v| NetCounters {
                tx_bytes: acc.tx_bytes.saturating_add(v.tx_bytes.unwrap_or(0)),
                rx_bytes: acc.rx_bytes.saturating_add(v.rx_bytes.unwrap_or(0)),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::ContainerNetworkStats;
    use std::collections::HashMap;

    fn iface(rx: u64, tx: u64) -> ContainerNetworkStats {
        ContainerNetworkStats {
            rx_bytes: Some(rx),
            tx_bytes: Some(tx),
            ..Default::default()
        }
    }

    #[test]
    fn network_counters_sums_all_interfaces() {
        let s = ContainerStatsResponse {
            networks: Some(HashMap::from([
                ("eth0".to_string(), iface(1000, 2000)),
                ("eth1".to_string(), iface(24, 6)),
            ])),
            ..Default::default()
        };
        let out = network_counters(&s);
        assert_eq!(out.rx_bytes, 1024);
        assert_eq!(out.tx_bytes, 2006);
    }

    #[test]
    fn network_counters_missing_networks_is_zero() {
        let s = ContainerStatsResponse::default();
        assert_eq!(network_counters(&s), NetCounters::default());
    }

    #[test]
    fn network_counters_treats_missing_fields_as_zero() {
        let s = ContainerStatsResponse {
            networks: Some(HashMap::from([(
                "eth0".to_string(),
                ContainerNetworkStats {
                    rx_bytes: Some(7),
                    ..Default::default()
                },
            )])),
            ..Default::default()
        };
        assert_eq!(network_counters(&s), NetCounters::new(0, 7));
    }
}
