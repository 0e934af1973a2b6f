#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ItemStoreMetricsSnapshot {
    pub count_queries: u64,
    pub page_loads: u64,
    pub load_failures: u64,
    pub page_hits: u64,
    pub page_misses: u64,
    pub stale_reloads: u64, // misses that replaced a stale resident page
    pub evictions: u64,
    pub resets: u64,

    pub added: u64,
    pub modified: u64,
    pub removed: u64,

    // gauges captured at snapshot time
    pub resident_pages: usize,
    pub max_cache_size: i64,
}

impl ItemStoreMetricsSnapshot {
    /// Fraction of page lookups served from the cache.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.page_hits + self.page_misses;
        if lookups == 0 {
            0.0
        } else {
            self.page_hits as f64 / lookups as f64
        }
    }
}
