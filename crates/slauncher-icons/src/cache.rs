//! Byte-bounded LRU store for rendered icons.

use crate::types::{CacheKey, CacheUtilization, RenderedIcon};
use log::debug;
use lru::LruCache;

struct CacheEntry {
    icon: RenderedIcon,
    cost: usize,
}

/// Rendered icons keyed by application id.
///
/// Capacity is measured in bytes of pixel data, not entry count. Inserting
/// past capacity evicts least recently used entries until the total fits
/// again, which can include the entry that was just inserted.
pub struct IconCache {
    entries: LruCache<CacheKey, CacheEntry>,
    total_cost: usize,
    capacity: usize,
}

impl IconCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            total_cost: 0,
            capacity,
        }
    }

    /// Look up an icon and mark it most recently used.
    pub fn get(&mut self, key: &str) -> Option<RenderedIcon> {
        self.entries.get(key).map(|entry| entry.icon.clone())
    }

    /// Presence check that leaves the LRU order alone.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Insert or replace an icon, then evict down to capacity.
    pub fn put(&mut self, key: CacheKey, icon: RenderedIcon) {
        let cost = icon.byte_size();

        if let Some(old) = self.entries.put(key, CacheEntry { icon, cost }) {
            self.total_cost -= old.cost;
        }
        self.total_cost += cost;

        self.trim_to_capacity();
    }

    /// Drop every entry. Calling it on an empty cache is a no-op.
    pub fn evict_all(&mut self) {
        self.entries.clear();
        self.total_cost = 0;
    }

    pub fn utilization(&self) -> CacheUtilization {
        let percent_full = if self.capacity == 0 {
            0
        } else {
            (self.total_cost.saturating_mul(100) / self.capacity) as u32
        };

        CacheUtilization {
            count: self.entries.len(),
            total_cost: self.total_cost,
            capacity: self.capacity,
            percent_full,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_cost(&self) -> usize {
        self.total_cost
    }

    fn trim_to_capacity(&mut self) {
        while self.total_cost > self.capacity {
            match self.entries.pop_lru() {
                Some((key, entry)) => {
                    self.total_cost -= entry.cost;
                    debug!("Evicted icon '{}' ({} bytes)", key, entry.cost);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    /// 5x5 RGBA = 100 bytes.
    fn icon_100() -> RenderedIcon {
        RenderedIcon::new(RgbaImage::new(5, 5))
    }

    fn keys(cache: &IconCache) -> Vec<&str> {
        let mut keys: Vec<&str> = cache.entries.iter().map(|(k, _)| k.as_str()).collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_lru_promotion_decides_eviction() {
        let mut cache = IconCache::new(300);
        cache.put("A".into(), icon_100());
        cache.put("B".into(), icon_100());
        cache.put("C".into(), icon_100());
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.total_cost(), 300);

        assert!(cache.get("A").is_some());
        cache.put("D".into(), icon_100());

        assert_eq!(keys(&cache), vec!["A", "C", "D"]);
        assert_eq!(cache.total_cost(), 300);
    }

    #[test]
    fn test_evicts_in_access_order() {
        let mut cache = IconCache::new(300);
        for key in ["A", "B", "C"] {
            cache.put(key.into(), icon_100());
        }
        cache.get("B");
        cache.get("A");

        cache.put("D".into(), icon_100());
        assert!(!cache.contains("C"));
        cache.put("E".into(), icon_100());
        assert!(!cache.contains("B"));
        cache.put("F".into(), icon_100());
        assert!(!cache.contains("A"));

        assert_eq!(keys(&cache), vec!["D", "E", "F"]);
    }

    #[test]
    fn test_large_entry_evicts_several() {
        let mut cache = IconCache::new(300);
        for key in ["A", "B", "C"] {
            cache.put(key.into(), icon_100());
        }

        // 7x7 RGBA = 196 bytes, needs two 100-byte slots.
        cache.put("big".into(), RenderedIcon::new(RgbaImage::new(7, 7)));

        assert_eq!(keys(&cache), vec!["C", "big"]);
        assert!(cache.total_cost() <= cache.capacity());
    }

    #[test]
    fn test_oversized_entry_is_not_retained() {
        let mut cache = IconCache::new(300);
        cache.put("A".into(), icon_100());
        cache.put("huge".into(), RenderedIcon::new(RgbaImage::new(10, 10)));

        assert!(!cache.contains("huge"));
        assert!(cache.is_empty());
        assert_eq!(cache.total_cost(), 0);
    }

    #[test]
    fn test_replacing_key_updates_cost() {
        let mut cache = IconCache::new(1_000);
        cache.put("A".into(), icon_100());
        cache.put("A".into(), RenderedIcon::new(RgbaImage::new(10, 10)));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_cost(), 400);
    }

    #[test]
    fn test_contains_does_not_promote() {
        let mut cache = IconCache::new(200);
        cache.put("A".into(), icon_100());
        cache.put("B".into(), icon_100());

        assert!(cache.contains("A"));
        cache.put("C".into(), icon_100());

        assert_eq!(keys(&cache), vec!["B", "C"]);
    }

    #[test]
    fn test_evict_all_is_idempotent() {
        let mut cache = IconCache::new(300);
        cache.put("A".into(), icon_100());

        cache.evict_all();
        assert!(cache.get("A").is_none());
        cache.evict_all();

        assert_eq!(cache.utilization(), CacheUtilization {
            count: 0,
            total_cost: 0,
            capacity: 300,
            percent_full: 0,
        });
    }

    #[test]
    fn test_utilization_reports_percent() {
        let mut cache = IconCache::new(400);
        cache.put("A".into(), icon_100());

        let usage = cache.utilization();
        assert_eq!(usage.count, 1);
        assert_eq!(usage.percent_full, 25);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut cache = IconCache::new(0);
        cache.put("A".into(), icon_100());

        assert!(cache.is_empty());
        assert_eq!(cache.utilization().percent_full, 0);
    }
}
