//! Agent wiring: configuration, policy slot, metric table, event queue.
//!
//! The [`Agent`] is the piece the monitored service embeds once per
//! process. It owns the collaborators every transaction shares: the local
//! configuration snapshot, the remote policy slot replaced wholesale on
//! each (re)connect, the metric table, and the pending error-event queue
//! that harvesting drains.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::AgentConfig;
use crate::metrics::MetricTable;
use crate::policy::RemotePolicy;
use crate::record::{ErrorEvent, EventQueue};
use crate::stack::StackLocator;
use crate::transaction::{Transaction, TransactionKind};

/// Per-process agent handle.
///
/// Cheap to share behind an `Arc`; transactions started from it feed the
/// same metric table and event queue.
#[derive(Debug)]
pub struct Agent {
    config: Arc<AgentConfig>,
    policy: Arc<RwLock<RemotePolicy>>,
    metrics: MetricTable,
    events: EventQueue,
    locator: StackLocator,
}

impl Agent {
    /// Create an agent with the given local configuration.
    ///
    /// Until a connect reply arrives the remote policy defaults to
    /// collect-everything, matching a collector that has not restricted
    /// anything yet.
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config: Arc::new(config),
            policy: Arc::new(RwLock::new(RemotePolicy::default())),
            metrics: MetricTable::new(),
            events: EventQueue::new(),
            locator: StackLocator::new(),
        }
    }

    /// Replace the remote policy with the snapshot from a connect reply.
    ///
    /// The swap is wholesale: in-flight notifications see either the old
    /// or the new policy, never a mix.
    pub fn apply_connect_reply(&self, policy: RemotePolicy) {
        match self.policy.write() {
            Ok(mut slot) => *slot = policy,
            Err(poisoned) => *poisoned.into_inner() = policy,
        }
        debug!(
            collect_errors = policy.collect_errors,
            collect_error_events = policy.collect_error_events,
            "applied remote policy"
        );
    }

    /// Start a background transaction.
    pub fn start_transaction(&self, name: impl Into<String>) -> Transaction {
        self.start(name.into(), TransactionKind::Other, None)
    }

    /// Start a web transaction with its request URL.
    pub fn start_web_transaction(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Transaction {
        self.start(name.into(), TransactionKind::Web, Some(url.into()))
    }

    fn start(&self, name: String, kind: TransactionKind, url: Option<String>) -> Transaction {
        debug!(transaction = %name, ?kind, "starting transaction");
        Transaction::new(
            name,
            kind,
            url,
            Arc::clone(&self.config),
            Arc::clone(&self.policy),
            self.metrics.clone(),
            self.events.clone(),
            self.locator.clone(),
        )
    }

    /// The local configuration this agent was created with.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The shared metric table, for harvest-time flushing and tests.
    pub fn metrics(&self) -> &MetricTable {
        &self.metrics
    }

    /// Number of error events awaiting harvest.
    pub fn pending_error_events(&self) -> usize {
        self.events.len()
    }

    /// Take every pending error event, leaving the queue empty.
    pub fn drain_error_events(&self) -> Vec<ErrorEvent> {
        self.events.drain()
    }
}
