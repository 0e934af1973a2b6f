use crate::metrics::traits::{MetricsReset, OverlayMetricsRecorder, PageCacheMetricsRecorder};

#[derive(Debug, Default, Clone)]
pub struct ItemStoreMetrics {
    pub count_queries: u64,
    pub page_loads: u64,
    pub load_failures: u64,
    pub page_hits: u64,
    pub page_misses: u64,
    pub stale_reloads: u64,
    pub evictions: u64,
    pub resets: u64,
    pub added: u64,
    pub modified: u64,
    pub removed: u64,
}

impl PageCacheMetricsRecorder for ItemStoreMetrics {
    fn record_count_query(&mut self) {
        self.count_queries += 1;
    }

    fn record_page_load(&mut self) {
        self.page_loads += 1;
    }

    fn record_load_failure(&mut self) {
        self.load_failures += 1;
    }

    fn record_page_hit(&mut self) {
        self.page_hits += 1;
    }

    fn record_page_miss(&mut self) {
        self.page_misses += 1;
    }

    fn record_stale_reload(&mut self) {
        self.stale_reloads += 1;
    }

    fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    fn record_reset(&mut self) {
        self.resets += 1;
    }
}

impl OverlayMetricsRecorder for ItemStoreMetrics {
    fn record_added(&mut self) {
        self.added += 1;
    }

    fn record_modified(&mut self) {
        self.modified += 1;
    }

    fn record_removed(&mut self) {
        self.removed += 1;
    }
}

impl MetricsReset for ItemStoreMetrics {
    fn reset_metrics(&mut self) {
        *self = Self::default();
    }
}
