//! # Metrics Trait Hierarchy
//!
//! ```text
//!   ┌─────────────────────────────┐
//!   │  PageCacheMetricsRecorder   │   written by ItemStore on every
//!   │  count / load / hit / miss  │   provider call and cache lookup
//!   │  evict / reset              │
//!   └──────────────┬──────────────┘
//!                  │
//!                  ▼
//!   ┌─────────────────────────────┐
//!   │  OverlayMetricsRecorder     │   written on add / modify / remove
//!   └─────────────────────────────┘
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsReset                 │
//!   │ (bench/test)                 │    │ (between bench iterations)   │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters for provider traffic and page cache behavior.
pub trait PageCacheMetricsRecorder {
    fn record_count_query(&mut self);
    fn record_page_load(&mut self);
    fn record_load_failure(&mut self);
    fn record_page_hit(&mut self);
    fn record_page_miss(&mut self);
    fn record_stale_reload(&mut self);
    fn record_eviction(&mut self);
    fn record_reset(&mut self);
}

/// Counters for overlay mutations.
pub trait OverlayMetricsRecorder: PageCacheMetricsRecorder {
    fn record_added(&mut self);
    fn record_modified(&mut self);
    fn record_removed(&mut self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&mut self);
}
