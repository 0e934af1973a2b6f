//! Page cache and overlay counters (feature `metrics`).
//!
//! Recording is separated from snapshotting the same way for every
//! component: the store writes counters through [`traits::PageCacheMetricsRecorder`],
//! tests and benches read them through [`traits::MetricsSnapshotProvider`].

pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
