// Container appeared/disappeared -> chart add/remove

use crate::charts::{SeriesRegistry, container_charts};
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

/// Escape a display name for use inside compound keys such as
/// `container_<key>_network_bytes_tx`. `_` is the key separator, so it is
/// doubled; anything else outside `[A-Za-z0-9.-]` becomes `_<hex codepoint>_`.
/// The mapping is injective: distinct names never share a key.
pub fn series_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '_' => out.push_str("__"),
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' => out.push(c),
            c => {
                let _ = write!(out, "_{:x}_", u32::from(c));
            }
        }
    }
    out
}

/// Tracks which containers have live charts and the exact chart ids created
/// for each, so removal never relies on prefix matching.
pub struct ContainerSeries {
    registry: Arc<dyn SeriesRegistry>,
    active: HashMap<String, Vec<String>>,
}

impl ContainerSeries {
    pub fn new(registry: Arc<dyn SeriesRegistry>) -> Self {
        Self {
            registry,
            active: HashMap::new(),
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    pub fn active_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create the chart group for `name`. The caller checks `is_active` first.
    /// Registry failures are logged; the name is still marked active so the
    /// next poll does not retry the add.
    pub fn add_series_for(&mut self, name: &str) {
        let key = series_key(name);
        let mut created = Vec::new();
        for chart in container_charts(&key, name) {
            let id = chart.id.clone();
            match self.registry.add(chart) {
                Ok(()) => created.push(id),
                Err(e) => tracing::warn!(
                    container = name,
                    error = %e,
                    operation = "add_series",
                    "chart registration failed"
                ),
            }
        }
        tracing::debug!(container = name, charts = created.len(), "series added");
        self.active.insert(name.to_string(), created);
    }

    /// Remove exactly the charts created for `name` and forget it.
    pub fn remove_series_for(&mut self, name: &str) {
        let Some(ids) = self.active.remove(name) else {
            return;
        };
        for id in ids {
            if let Err(e) = self.registry.remove(&id) {
                tracing::warn!(
                    container = name,
                    chart = %id,
                    error = %e,
                    operation = "remove_series",
                    "chart removal failed"
                );
            }
        }
        tracing::debug!(container = name, "series removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartRegistry;

    #[test]
    fn series_key_escapes_separator() {
        assert_eq!(series_key("web"), "web");
        assert_eq!(series_key("my_app"), "my__app");
        assert_eq!(series_key("a.b-c"), "a.b-c");
        assert_eq!(series_key("weird name/x"), "weird_20_name_2f_x");
        assert_eq!(series_key("café"), "caf_e9_");
        assert_ne!(series_key("a_b"), series_key("a__b"));
    }

    #[test]
    fn series_key_keeps_distinct_names_apart() {
        let names = ["a b", "a-b", "a_b", "a_20_b", "a/b", "a__b", "a.b"];
        let keys: std::collections::HashSet<String> =
            names.iter().map(|n| series_key(n)).collect();
        assert_eq!(keys.len(), names.len());
    }

    #[test]
    fn removal_does_not_touch_names_sharing_a_prefix() {
        let registry = Arc::new(ChartRegistry::new());
        let mut series = ContainerSeries::new(registry.clone());
        series.add_series_for("web");
        series.add_series_for("web_1");
        assert_eq!(registry.len(), 2);

        series.remove_series_for("web");
        assert!(!series.is_active("web"));
        assert!(series.is_active("web_1"));
        assert!(registry.contains("network_web__1_bytes"));
        assert!(!registry.contains("network_web_bytes"));
    }

    #[test]
    fn registry_duplicate_is_tolerated() {
        let registry = Arc::new(ChartRegistry::new());
        let mut first = ContainerSeries::new(registry.clone());
        let mut second = ContainerSeries::new(registry.clone());
        first.add_series_for("db");
        second.add_series_for("db");
        assert!(second.is_active("db"));
        assert_eq!(registry.len(), 1);

        // Nothing was created by `second`, so its removal leaves the chart alone.
        second.remove_series_for("db");
        assert!(registry.contains("network_db_bytes"));
    }

    #[test]
    fn remove_unknown_name_is_a_no_op() {
        let registry = Arc::new(ChartRegistry::new());
        let mut series = ContainerSeries::new(registry.clone());
        series.remove_series_for("ghost");
        assert!(series.active_names().is_empty());
    }
}
