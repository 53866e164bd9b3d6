// In-memory chart catalogue

use super::Chart;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate chart id '{0}'")]
    Duplicate(String),
    #[error("unknown chart id '{0}'")]
    NotFound(String),
}

/// Accepts chart additions and removals from collectors.
pub trait SeriesRegistry: Send + Sync {
    fn add(&self, chart: Chart) -> Result<(), RegistryError>;
    fn remove(&self, id: &str) -> Result<(), RegistryError>;
}

/// Charts kept in insertion order; served by `/api/charts`.
#[derive(Default)]
pub struct ChartRegistry {
    charts: RwLock<Vec<Chart>>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> Vec<Chart> {
        self.charts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.charts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.charts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SeriesRegistry for ChartRegistry {
    fn add(&self, chart: Chart) -> Result<(), RegistryError> {
        let mut charts = self.charts.write().unwrap_or_else(PoisonError::into_inner);
        if charts.iter().any(|c| c.id == chart.id) {
            return Err(RegistryError::Duplicate(chart.id));
        }
        charts.push(chart);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), RegistryError> {
        let mut charts = self.charts.write().unwrap_or_else(PoisonError::into_inner);
        let before = charts.len();
        charts.retain(|c| c.id != id);
        if charts.len() == before {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{container_charts, summary_chart};

    #[test]
    fn add_rejects_duplicate_ids() {
        let registry = ChartRegistry::new();
        registry.add(summary_chart()).unwrap();
        let err = registry.add(summary_chart()).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("network_bytes".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_is_exact_match() {
        let registry = ChartRegistry::new();
        for chart in container_charts("web", "web")
            .into_iter()
            .chain(container_charts("web-1", "web-1"))
        {
            registry.add(chart).unwrap();
        }
        registry.remove("network_web_bytes").unwrap();
        assert!(!registry.contains("network_web_bytes"));
        assert!(registry.contains("network_web-1_bytes"));
        assert_eq!(
            registry.remove("network_web_bytes"),
            Err(RegistryError::NotFound("network_web_bytes".into()))
        );
    }
}
