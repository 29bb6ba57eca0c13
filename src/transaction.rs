//! Transactions: tracked units of work and the notice-error pipeline.
//!
//! A [`Transaction`] represents one web request or background task inside
//! the monitored process. Instrumented code reports runtime errors through
//! [`Transaction::notice_error`], which drives the full pipeline: policy
//! gate, classification, caller attribution, record/event build, and
//! metric emission. Only the gate can short-circuit the rest.

use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use crate::classify::{classify, Noticeable, AGENT_NAMESPACE};
use crate::config::AgentConfig;
use crate::metrics::{self, MetricTable};
use crate::policy::{NoticeError, PolicyGate, RemotePolicy, HIGH_SECURITY_MESSAGE};
use crate::record::{ErrorEvent, ErrorRecord, EventQueue};
use crate::stack::StackLocator;

/// Kind of work a transaction tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// A web request; carries a request URL.
    Web,
    /// A background task; never carries a URL.
    Other,
}

impl TransactionKind {
    /// Whether this is a web transaction.
    pub fn is_web(&self) -> bool {
        matches!(self, TransactionKind::Web)
    }

    /// Prefix used to build full transaction names.
    pub(crate) fn name_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Web => "WebTransaction",
            TransactionKind::Other => "OtherTransaction",
        }
    }

    /// Baseline rollup metric incremented when a transaction of this kind
    /// ends.
    pub(crate) fn rollup_metric(&self) -> &'static str {
        match self {
            TransactionKind::Web => metrics::WEB_ROLLUP,
            TransactionKind::Other => metrics::OTHER_ROLLUP,
        }
    }
}

/// Lifecycle state; transitions to `Ended` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Active,
    Ended,
}

/// State that must stay consistent with the lifecycle transition.
#[derive(Debug)]
struct TransactionInner {
    state: LifecycleState,
    error: Option<ErrorRecord>,
}

/// One tracked unit of work.
///
/// Name and kind are immutable after creation. The local configuration is
/// a snapshot taken when the transaction started; the remote policy is
/// read fresh on every notification. The error slot holds at most one
/// record with most-recent-wins semantics (see [`Self::notice_error`]).
#[derive(Debug)]
pub struct Transaction {
    name: String,
    full_name: String,
    kind: TransactionKind,
    url: Option<String>,
    config: Arc<AgentConfig>,
    policy: Arc<RwLock<RemotePolicy>>,
    metrics: MetricTable,
    events: EventQueue,
    locator: StackLocator,
    inner: Mutex<TransactionInner>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        kind: TransactionKind,
        url: Option<String>,
        config: Arc<AgentConfig>,
        policy: Arc<RwLock<RemotePolicy>>,
        metrics: MetricTable,
        events: EventQueue,
        locator: StackLocator,
    ) -> Self {
        let full_name = format!("{}/{}", kind.name_prefix(), name);
        // URL is a web-only attribute.
        let url = match kind {
            TransactionKind::Web => url,
            TransactionKind::Other => None,
        };
        Self {
            name,
            full_name,
            kind,
            url,
            config,
            policy,
            metrics,
            events,
            locator,
            inner: Mutex::new(TransactionInner {
                state: LifecycleState::Active,
                error: None,
            }),
        }
    }

    /// The short name the transaction was started with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full reporting name, e.g. `WebTransaction/checkout`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Kind of work this transaction tracks.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Request URL; `None` for background transactions.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Whether the transaction can still accept notifications.
    pub fn is_active(&self) -> bool {
        self.lock_inner().state == LifecycleState::Active
    }

    /// Report a runtime error against this transaction.
    ///
    /// Accepts anything convertible into `Option<E>`, so both
    /// `txn.notice_error(err)` and `txn.notice_error::<MyError>(None)`
    /// work; `None` (and an error rendering an empty message) rejects with
    /// [`NoticeError::NilInput`].
    ///
    /// On success the record replaces any previously stored one
    /// (most-recent-wins), error-rate metrics are incremented, and a
    /// sampled event is enqueued when both event switches are on.
    /// Rejections are reported as stable, comparable [`NoticeError`]
    /// values and have no side effects beyond a debug log line.
    pub fn notice_error<E>(&self, error: impl Into<Option<E>>) -> Result<(), NoticeError>
    where
        E: Noticeable,
    {
        let Some(error) = error.into() else {
            debug!(transaction = %self.full_name, "notice_error called without an error value");
            return Err(NoticeError::NilInput);
        };
        let message = error.to_string();

        // Hold the lifecycle lock across the whole pipeline so a
        // notification racing end() either completes fully before the
        // transition or rejects; no partially written record is ever
        // observable after the transaction has ended.
        let mut inner = self.lock_inner();

        let policy = self.policy_snapshot();
        let active = inner.state == LifecycleState::Active;
        let decision =
            match PolicyGate::evaluate(!message.is_empty(), active, &self.config, &policy) {
                Ok(decision) => decision,
                Err(outcome) => {
                    debug!(
                        transaction = %self.full_name,
                        outcome = %outcome,
                        "error notification rejected"
                    );
                    return Err(outcome);
                }
            };

        let classified = classify(&error, AGENT_NAMESPACE);
        let caller = self.locator.locate(classified.stack.as_ref());
        let message = if decision.redact {
            HIGH_SECURITY_MESSAGE.to_string()
        } else {
            message
        };

        let record = ErrorRecord::new(
            self.full_name.clone(),
            message,
            classified.class,
            caller,
            self.url.clone().unwrap_or_default(),
        );

        if decision.emit_event {
            self.events.enqueue(ErrorEvent::from_record(&record));
        }

        debug!(
            transaction = %self.full_name,
            class = %record.class,
            caller = %record.caller,
            "captured error"
        );
        inner.error = Some(record);

        metrics::record_error_metrics(&self.metrics, self.kind, &self.full_name);
        Ok(())
    }

    /// End the transaction and hand it to the harvester.
    ///
    /// Idempotent: baseline rollup metrics are emitted on the first call
    /// only, and every later `notice_error` rejects with
    /// [`NoticeError::AlreadyEnded`].
    pub fn end(&self) {
        let mut inner = self.lock_inner();
        if inner.state == LifecycleState::Ended {
            return;
        }
        inner.state = LifecycleState::Ended;
        self.metrics.increment(&self.full_name);
        self.metrics.increment(self.kind.rollup_metric());
        debug!(transaction = %self.full_name, "transaction ended");
    }

    /// The currently stored error record, for the harvester.
    pub fn error_record(&self) -> Option<ErrorRecord> {
        self.lock_inner().error.clone()
    }

    /// A poisoned lock still holds consistent state; keep serving rather
    /// than panicking inside the host process.
    fn lock_inner(&self) -> std::sync::MutexGuard<'_, TransactionInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn policy_snapshot(&self) -> RemotePolicy {
        match self.policy.read() {
            Ok(policy) => *policy,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
