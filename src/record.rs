//! Error records, error events, and the harvest-side event queue.
//!
//! A successful capture always produces an [`ErrorRecord`]; it additionally
//! produces an [`ErrorEvent`] when both event switches are on. Records live
//! on their transaction until harvest; events are pushed onto the agent's
//! shared [`EventQueue`] for the sampling collaborator to drain.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable artifact of one captured error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Full transaction name, e.g. `WebTransaction/checkout`.
    pub txn_name: String,
    /// Error message, possibly redacted; never empty.
    pub message: String,
    /// Class label; never empty.
    pub class: String,
    /// Caller locator; empty when no application frame was found.
    pub caller: String,
    /// Request URL; empty for background transactions.
    pub url: String,
    /// When the error was noticed.
    pub noticed_at: DateTime<Utc>,
}

impl ErrorRecord {
    /// Build a record timestamped now.
    pub fn new(
        txn_name: impl Into<String>,
        message: impl Into<String>,
        class: impl Into<String>,
        caller: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            txn_name: txn_name.into(),
            message: message.into(),
            class: class.into(),
            caller: caller.into(),
            url: url.into(),
            noticed_at: Utc::now(),
        }
    }
}

/// Sampled, lighter-weight telemetry artifact of a captured error.
///
/// An event exists only when a record was also produced for the same
/// notification; the reverse does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Full transaction name.
    pub txn_name: String,
    /// Error message, possibly redacted.
    pub message: String,
    /// Class label.
    pub class: String,
}

impl ErrorEvent {
    /// Derive the event from the record built for the same notification,
    /// so redaction applies to both identically.
    pub fn from_record(record: &ErrorRecord) -> Self {
        Self {
            txn_name: record.txn_name.clone(),
            message: record.message.clone(),
            class: record.class.clone(),
        }
    }
}

/// Shared queue of pending error events awaiting harvest.
///
/// Cloning is cheap and all clones feed the same queue, so every
/// transaction started by an agent enqueues into the agent's queue.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: Arc<Mutex<Vec<ErrorEvent>>>,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event for the next harvest.
    pub fn enqueue(&self, event: ErrorEvent) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(event);
        }
    }

    /// Take every pending event, leaving the queue empty.
    pub fn drain(&self) -> Vec<ErrorEvent> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }

    /// Number of events awaiting harvest.
    pub fn len(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_record_new() {
        let record = ErrorRecord::new(
            "OtherTransaction/hello",
            "my msg",
            "watchtower.MyError",
            "app.main",
            "",
        );
        assert_eq!(record.txn_name, "OtherTransaction/hello");
        assert_eq!(record.message, "my msg");
        assert_eq!(record.class, "watchtower.MyError");
        assert_eq!(record.caller, "app.main");
        assert!(record.url.is_empty());
    }

    #[test]
    fn test_event_mirrors_record() {
        let record = ErrorRecord::new("WebTransaction/hello", "boom", "zap", "app.main", "/hello");
        let event = ErrorEvent::from_record(&record);
        assert_eq!(event.txn_name, record.txn_name);
        assert_eq!(event.message, record.message);
        assert_eq!(event.class, record.class);
    }

    #[test]
    fn test_record_serializes_for_transport() {
        let record = ErrorRecord::new("WebTransaction/hello", "boom", "zap", "", "/hello");
        let json = serde_json::to_string(&record).expect("serialize");
        let roundtrip: ErrorRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(record, roundtrip);
    }

    #[test]
    fn test_queue_enqueue_and_drain() {
        let queue = EventQueue::new();
        assert!(queue.is_empty());

        queue.enqueue(ErrorEvent {
            txn_name: "OtherTransaction/a".to_string(),
            message: "one".to_string(),
            class: "c".to_string(),
        });
        queue.enqueue(ErrorEvent {
            txn_name: "OtherTransaction/b".to_string(),
            message: "two".to_string(),
            class: "c".to_string(),
        });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "one");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_clones_share_storage() {
        let queue = EventQueue::new();
        let clone = queue.clone();
        clone.enqueue(ErrorEvent {
            txn_name: "t".to_string(),
            message: "m".to_string(),
            class: "c".to_string(),
        });
        assert_eq!(queue.len(), 1);
    }
}
