//! Error-rate metric names and the concurrent metric table.
//!
//! The pipeline only increments named counters; aggregation beyond
//! counting (timings, percentiles, rollup math) belongs to the harvest
//! collaborators. The fixed error-rate set mirrors the classic APM naming
//! scheme so dashboards can distinguish web from background failures and
//! drill down to the offending transaction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::transaction::TransactionKind;

/// Process-wide error counter.
pub const ERRORS_ALL: &str = "Errors/all";
/// Error counter scoped to web transactions.
pub const ERRORS_ALL_WEB: &str = "Errors/allWeb";
/// Error counter scoped to background transactions.
pub const ERRORS_ALL_OTHER: &str = "Errors/allOther";
/// Baseline rollup incremented when a web transaction ends.
pub const WEB_ROLLUP: &str = "WebTransaction/all";
/// Baseline rollup incremented when a background transaction ends.
pub const OTHER_ROLLUP: &str = "OtherTransaction/all";

/// Error counter scoped to a specific transaction,
/// e.g. `Errors/WebTransaction/checkout`.
pub fn errors_scoped_name(full_txn_name: &str) -> String {
    format!("Errors/{full_txn_name}")
}

/// Thread-safe table of named counters.
///
/// Cloning is cheap and all clones share the same counters; concurrent
/// increments from many transactions are never lost.
#[derive(Debug, Clone, Default)]
pub struct MetricTable {
    counts: Arc<RwLock<HashMap<String, u64>>>,
}

impl MetricTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one, creating it at zero first if needed.
    pub fn increment(&self, name: &str) {
        if let Ok(mut counts) = self.counts.write() {
            *counts.entry(name.to_owned()).or_insert(0) += 1;
        }
    }

    /// Current value of a counter; zero when it was never incremented.
    pub fn get(&self, name: &str) -> u64 {
        self.counts
            .read()
            .map(|counts| counts.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Copy of every counter, for harvest-time flushing.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts
            .read()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }

    /// Number of distinct counters.
    pub fn len(&self) -> usize {
        self.counts.read().map(|counts| counts.len()).unwrap_or(0)
    }

    /// Whether no counter exists yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Emit the fixed error-rate metric set for one captured error.
///
/// Runs on every accepted capture, independent of whether an event was
/// also emitted: event sampling and metric accounting are separate
/// concerns.
pub fn record_error_metrics(table: &MetricTable, kind: TransactionKind, full_txn_name: &str) {
    table.increment(ERRORS_ALL);
    table.increment(match kind {
        TransactionKind::Web => ERRORS_ALL_WEB,
        TransactionKind::Other => ERRORS_ALL_OTHER,
    });
    table.increment(&errors_scoped_name(full_txn_name));
}
