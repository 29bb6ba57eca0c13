//! Capture policy: the remote policy snapshot and the ordered gate checks.
//!
//! A notification passes through one gate before anything else runs. The
//! gate combines the transaction's lifecycle state with three independent
//! switches: the local error-collector toggle, the remote collect-errors
//! policy, and high security mode. Either disable alone suffices to block
//! capture; lifecycle and missing-input checks come first because they are
//! usage errors rather than configuration choices.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AgentConfig;

/// Placeholder stored in place of the message under high security mode.
///
/// Not configurable: the original message must never leave the process
/// when high security is on.
pub const HIGH_SECURITY_MESSAGE: &str = "message removed by high security setting";

/// Remote policy received from the collector at connect time.
///
/// Replaced wholesale on reconnect via
/// [`Agent::apply_connect_reply`](crate::agent::Agent::apply_connect_reply);
/// the pipeline reads it fresh on every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePolicy {
    /// Whether the collector accepts error records.
    #[serde(default = "default_true")]
    pub collect_errors: bool,
    /// Whether the collector accepts sampled error events.
    #[serde(default = "default_true")]
    pub collect_error_events: bool,
}

impl Default for RemotePolicy {
    fn default() -> Self {
        Self {
            collect_errors: true,
            collect_error_events: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Why an error notification was rejected.
///
/// Stable, comparable values so instrumentation code can branch on the
/// outcome. None of these is fatal; each applies to a single notification
/// and carries no retry semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoticeError {
    /// The transaction had already ended when the error was noticed.
    #[error("transaction has already ended")]
    AlreadyEnded,

    /// No error value (or an empty message) was provided.
    #[error("no error value was provided")]
    NilInput,

    /// Error collection is switched off in the local configuration.
    #[error("error collection disabled by local configuration")]
    LocallyDisabled,

    /// Error collection is switched off by the remote policy.
    #[error("error collection disabled by remote policy")]
    RemotelyDisabled,
}

/// What a successful gate evaluation permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDecision {
    /// Replace the message with [`HIGH_SECURITY_MESSAGE`] before recording.
    pub redact: bool,
    /// Additionally emit a sampled error event.
    pub emit_event: bool,
}

/// The ordered policy checks run before any capture work happens.
#[derive(Debug, Clone, Copy)]
pub struct PolicyGate;

impl PolicyGate {
    /// Evaluate the gate for one notification. First match wins; later
    /// checks are not evaluated.
    ///
    /// 1. no input → [`NoticeError::NilInput`]
    /// 2. transaction not active → [`NoticeError::AlreadyEnded`]
    /// 3. local collector disabled → [`NoticeError::LocallyDisabled`]
    /// 4. remote collection disabled → [`NoticeError::RemotelyDisabled`]
    /// 5. otherwise a [`CaptureDecision`]: redact iff high security is on,
    ///    emit an event iff both the local and the remote event switches
    ///    are on.
    pub fn evaluate(
        input_present: bool,
        transaction_active: bool,
        config: &AgentConfig,
        policy: &RemotePolicy,
    ) -> Result<CaptureDecision, NoticeError> {
        if !input_present {
            return Err(NoticeError::NilInput);
        }
        if !transaction_active {
            return Err(NoticeError::AlreadyEnded);
        }
        if !config.error_collector.enabled {
            return Err(NoticeError::LocallyDisabled);
        }
        if !policy.collect_errors {
            return Err(NoticeError::RemotelyDisabled);
        }
        Ok(CaptureDecision {
            redact: config.high_security,
            emit_event: config.error_collector.capture_events && policy.collect_error_events,
        })
    }
}
