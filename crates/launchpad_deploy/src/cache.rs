use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

/// Lists the console caches per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedList {
    Jobs,
    Integrations,
}

/// Per-resource cache of list responses. Deployments and removals drop the
/// entries of the resource they touched so the next read refetches.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<(String, CachedList), Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, resource_id: &str, list: CachedList, value: Value) {
        self.entries.write().insert((resource_id.to_string(), list), value);
    }

    pub fn get(&self, resource_id: &str, list: CachedList) -> Option<Value> {
        self.entries
            .read()
            .get(&(resource_id.to_string(), list))
            .cloned()
    }

    /// Drop the job and integration lists of `resource_id`.
    pub fn invalidate(&self, resource_id: &str) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(id, _), _| id != resource_id);
        debug!(resource_id, dropped = before - entries.len(), "invalidated cached lists");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
