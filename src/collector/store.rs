// Last observed counters per container id

use crate::models::NetCounters;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// Keyed strictly on runtime id, never on display name, so a renamed or
/// replaced container never inherits another's baseline.
#[derive(Default)]
pub struct SnapshotStore {
    entries: Mutex<HashMap<String, NetCounters>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<NetCounters> {
        self.lock().get(id).copied()
    }

    /// Store `current` and return what it replaced.
    pub fn put(&self, id: &str, current: NetCounters) -> Option<NetCounters> {
        self.lock().insert(id.to_string(), current)
    }

    /// Drop every entry whose id is not in `live`. Returns the purged ids.
    pub fn retain_ids(&self, live: &HashSet<&str>) -> Vec<String> {
        let mut entries = self.lock();
        let stale: Vec<String> = entries
            .keys()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &stale {
            entries.remove(id);
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, NetCounters>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_returns_previous_snapshot() {
        let store = SnapshotStore::new();
        assert_eq!(store.put("a", NetCounters::new(1, 2)), None);
        assert_eq!(
            store.put("a", NetCounters::new(3, 4)),
            Some(NetCounters::new(1, 2))
        );
        assert_eq!(store.get("a"), Some(NetCounters::new(3, 4)));
    }

    #[test]
    fn retain_ids_purges_absent_containers() {
        let store = SnapshotStore::new();
        store.put("a", NetCounters::default());
        store.put("b", NetCounters::default());
        let live: HashSet<&str> = ["a"].into_iter().collect();
        assert_eq!(store.retain_ids(&live), vec!["b".to_string()]);
        assert_eq!(store.len(), 1);
        assert!(store.get("b").is_none());
    }
}
