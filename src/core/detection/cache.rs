//! Process-wide detection result cache
//!
//! Keyed by `table.column`. The cache is an explicit component with a
//! lifecycle: it is created once, shared by handle, and must be flushed
//! whenever the detection configuration changes (a cached result embeds the
//! thresholds it was computed under).

use crate::domain::DetectionResult;
use std::collections::HashMap;
use std::sync::RwLock;

/// Shared detection result cache, safe for concurrent read/write
#[derive(Debug, Default)]
pub struct DetectionCache {
    entries: RwLock<HashMap<String, DetectionResult>>,
}

impl DetectionCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cached result by `table.column` key
    pub fn get(&self, key: &str) -> Option<DetectionResult> {
        self.entries
            .read()
            .expect("detection cache lock poisoned")
            .get(key)
            .cloned()
    }

    /// Stores a result under its `table.column` key
    pub fn insert(&self, key: String, result: DetectionResult) {
        self.entries
            .write()
            .expect("detection cache lock poisoned")
            .insert(key, result);
    }

    /// Drops every entry; called on configuration change and shutdown
    pub fn invalidate_all(&self) {
        let mut entries = self
            .entries
            .write()
            .expect("detection cache lock poisoned");
        let dropped = entries.len();
        entries.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "Detection cache invalidated");
        }
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("detection cache lock poisoned")
            .len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ColumnRef;

    fn result(table: &str, column: &str) -> DetectionResult {
        DetectionResult::empty(ColumnRef::new(table, column))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = DetectionCache::new();
        cache.insert("users.email".to_string(), result("users", "email"));
        assert!(cache.get("users.email").is_some());
        assert!(cache.get("users.phone").is_none());
    }

    #[test]
    fn test_invalidate_all() {
        let cache = DetectionCache::new();
        cache.insert("a.b".to_string(), result("a", "b"));
        cache.insert("c.d".to_string(), result("c", "d"));
        assert_eq!(cache.len(), 2);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;

        let cache = Arc::new(DetectionCache::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                let key = format!("t.c{i}");
                cache.insert(key.clone(), result("t", &format!("c{i}")));
                assert!(cache.get(&key).is_some());
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }
}
