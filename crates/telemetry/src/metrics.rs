//! Internal metrics collection.
//!
//! Counters are in-memory, increment-only, and safe for concurrent callers.
//! The processor counters carry labels (origin, destination, change code),
//! so those use [`LabeledCounter`] keyed by the label values.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A counter family keyed by label values, e.g.
/// `correction_codes_processed{origin, destination, code}`.
#[derive(Debug, Default)]
pub struct LabeledCounter {
    series: Mutex<BTreeMap<Vec<String>, u64>>,
}

impl LabeledCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, labels: &[&str]) {
        let key: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        *self.series.lock().entry(key).or_insert(0) += 1;
    }

    /// Current value for an exact label set. Zero when never incremented.
    pub fn get(&self, labels: &[&str]) -> u64 {
        let key: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        self.series.lock().get(&key).copied().unwrap_or(0)
    }

    /// Sum across every label combination.
    pub fn total(&self) -> u64 {
        self.series.lock().values().sum()
    }

    pub fn snapshot(&self) -> BTreeMap<Vec<String>, u64> {
        self.series.lock().clone()
    }
}

/// Histogram for latency tracking, in milliseconds.
#[derive(Debug)]
pub struct Histogram {
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }
}

/// Collected metrics for the gateway.
#[derive(Debug, Default)]
pub struct Metrics {
    // RDFI scheduler
    pub ticks_started: Counter,
    pub ticks_completed: Counter,
    pub tick_errors: Counter,
    pub leadership_contended: Counter,

    // Downloader
    pub files_downloaded: Counter,
    pub download_errors: Counter,
    pub audit_files_saved: Counter,

    // Processor classification, labeled {origin, destination, [code]}
    pub correction_codes_processed: LabeledCounter,
    pub reconciliation_files_processed: LabeledCounter,
    pub return_entries_processed: LabeledCounter,
    pub prenote_entries_processed: LabeledCounter,
    pub incoming_files_processed: LabeledCounter,

    // Bus
    pub events_published: Counter,
    pub publish_errors: Counter,

    // Ingress HTTP
    pub files_submitted: Counter,
    pub files_cancelled: Counter,

    // Latency
    pub tick_latency_ms: Histogram,
    pub publish_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current scalar metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            ticks_started: self.ticks_started.get(),
            ticks_completed: self.ticks_completed.get(),
            tick_errors: self.tick_errors.get(),
            leadership_contended: self.leadership_contended.get(),
            files_downloaded: self.files_downloaded.get(),
            download_errors: self.download_errors.get(),
            audit_files_saved: self.audit_files_saved.get(),
            corrections_processed: self.correction_codes_processed.total(),
            reconciliations_processed: self.reconciliation_files_processed.total(),
            returns_processed: self.return_entries_processed.total(),
            prenotes_processed: self.prenote_entries_processed.total(),
            incomings_processed: self.incoming_files_processed.total(),
            events_published: self.events_published.get(),
            publish_errors: self.publish_errors.get(),
            tick_latency_mean_ms: self.tick_latency_ms.mean(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub ticks_started: u64,
    pub ticks_completed: u64,
    pub tick_errors: u64,
    pub leadership_contended: u64,
    pub files_downloaded: u64,
    pub download_errors: u64,
    pub audit_files_saved: u64,
    pub corrections_processed: u64,
    pub reconciliations_processed: u64,
    pub returns_processed: u64,
    pub prenotes_processed: u64,
    pub incomings_processed: u64,
    pub events_published: u64,
    pub publish_errors: u64,
    pub tick_latency_mean_ms: f64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
