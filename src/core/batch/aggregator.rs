//! Concurrency-safe run accumulator
//!
//! Each counter is an independent atomic; no invariant ties them together
//! until every worker has joined, so no lock is needed. Cost is stored in
//! fixed-point micro-units so the total does not depend on the order in
//! which concurrent workers add to it.

use super::types::{AggregateResult, ChunkReport};
use std::sync::atomic::{AtomicU64, Ordering};

const COST_SCALE: f64 = 1_000_000.0;

/// Shared accumulator for one run
#[derive(Debug, Default)]
pub struct ResultAggregator {
    cost_micros: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    conflicted: AtomicU64,
    cancelled: AtomicU64,
    throttled_responses: AtomicU64,
    attempts: AtomicU64,
    chunks: AtomicU64,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a committed chunk's charge and item count
    ///
    /// The cost total saturates at `u64::MAX` micro-units (about 1.8e13
    /// units) instead of wrapping.
    pub fn record_success(&self, cost_units: f64, item_count: usize) {
        let micros = to_micros(cost_units);
        let _ = self
            .cost_micros
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(micros))
            });
        self.succeeded
            .fetch_add(item_count as u64, Ordering::Relaxed);
    }

    /// Add permanently failed items
    pub fn record_failure(&self, item_count: usize) {
        self.failed.fetch_add(item_count as u64, Ordering::Relaxed);
    }

    /// Add failed items whose cause was an existing document
    pub fn record_conflicts(&self, item_count: usize) {
        self.conflicted
            .fetch_add(item_count as u64, Ordering::Relaxed);
    }

    /// Add items abandoned because the run was cancelled
    pub fn record_cancelled(&self, item_count: usize) {
        self.cancelled
            .fetch_add(item_count as u64, Ordering::Relaxed);
    }

    /// Fold one chunk's terminal report into the totals
    pub fn record_chunk(&self, report: &ChunkReport) {
        if report.succeeded > 0 || report.cost_units > 0.0 {
            self.record_success(report.cost_units, report.succeeded);
        }
        if report.failed > 0 {
            self.record_failure(report.failed);
        }
        if report.conflicted > 0 {
            self.record_conflicts(report.conflicted);
        }
        if report.cancelled > 0 {
            self.record_cancelled(report.cancelled);
        }
        self.throttled_responses
            .fetch_add(u64::from(report.throttled), Ordering::Relaxed);
        self.attempts
            .fetch_add(u64::from(report.attempts), Ordering::Relaxed);
        self.chunks.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the totals; only meaningful once all workers have joined
    pub fn snapshot(&self) -> AggregateResult {
        AggregateResult {
            total_cost_units: self.cost_micros.load(Ordering::Acquire) as f64 / COST_SCALE,
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            conflicted: self.conflicted.load(Ordering::Acquire),
            cancelled: self.cancelled.load(Ordering::Acquire),
            throttled_responses: self.throttled_responses.load(Ordering::Acquire),
            attempts: self.attempts.load(Ordering::Acquire),
            chunks: self.chunks.load(Ordering::Acquire),
        }
    }
}

// Float-to-int `as` casts saturate, so oversized charges clamp to `u64::MAX`.
fn to_micros(cost_units: f64) -> u64 {
    if cost_units.is_finite() && cost_units > 0.0 {
        (cost_units * COST_SCALE).round() as u64
    } else {
        0
    }
}
