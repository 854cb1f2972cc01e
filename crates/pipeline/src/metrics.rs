use extract::IngestReport;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    // Counters
    chunks_processed: AtomicUsize,
    extraction_failures: AtomicUsize,
    extractions_accepted: AtomicUsize,
    extractions_rejected: AtomicUsize,
    overlap_duplicates: AtomicUsize,
    concepts_merged: AtomicUsize,
    concepts_inserted: AtomicUsize,
    relations_validated: AtomicUsize,
    relations_skipped: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,

    // Timing (in microseconds)
    total_extract_time_us: AtomicU64,
    total_validate_time_us: AtomicU64,
    total_graph_time_us: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_chunk(&self, cache_hit: bool) {
        self.chunks_processed.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_failure(&self) {
        self.extraction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parsed(&self, accepted: usize, rejected: usize) {
        self.extractions_accepted.fetch_add(accepted, Ordering::Relaxed);
        self.extractions_rejected.fetch_add(rejected, Ordering::Relaxed);
    }

    /// Mentions dropped because an earlier overlapping chunk already
    /// reported them.
    pub fn record_duplicates(&self, count: usize) {
        self.overlap_duplicates.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_ingest(&self, report: &IngestReport, duration: Duration) {
        self.concepts_merged.fetch_add(report.merged, Ordering::Relaxed);
        self.concepts_inserted.fetch_add(report.inserted, Ordering::Relaxed);
        self.extractions_rejected.fetch_add(report.rejected, Ordering::Relaxed);
        self.total_extract_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_validation(&self, validated: usize, duration: Duration) {
        self.relations_validated.fetch_add(validated, Ordering::Relaxed);
        self.total_validate_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_graph(&self, skipped_relations: usize, duration: Duration) {
        self.relations_skipped.fetch_add(skipped_relations, Ordering::Relaxed);
        self.total_graph_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            extractions_accepted: self.extractions_accepted.load(Ordering::Relaxed),
            extractions_rejected: self.extractions_rejected.load(Ordering::Relaxed),
            overlap_duplicates: self.overlap_duplicates.load(Ordering::Relaxed),
            concepts_merged: self.concepts_merged.load(Ordering::Relaxed),
            concepts_inserted: self.concepts_inserted.load(Ordering::Relaxed),
            relations_validated: self.relations_validated.load(Ordering::Relaxed),
            relations_skipped: self.relations_skipped.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            avg_extract_time_ms: avg_time_ms(&self.total_extract_time_us, &self.chunks_processed),
            total_validate_time_ms: self.total_validate_time_us.load(Ordering::Relaxed) as f64 / 1000.0,
            total_graph_time_ms: self.total_graph_time_us.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub chunks_processed: usize,
    pub extraction_failures: usize,
    pub extractions_accepted: usize,
    pub extractions_rejected: usize,
    pub overlap_duplicates: usize,
    pub concepts_merged: usize,
    pub concepts_inserted: usize,
    pub relations_validated: usize,
    pub relations_skipped: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub avg_extract_time_ms: f64,
    pub total_validate_time_ms: f64,
    pub total_graph_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
