//! Watchtower - embedded APM error-capture pipeline
//!
//! Watchtower is the error-capture half of an application-performance-
//! monitoring agent that lives inside the monitored process. When
//! instrumented code notices a runtime error during a tracked transaction,
//! the pipeline gates the notification against local and remote policy,
//! classifies the error value, attributes it to a call site, redacts it
//! under high security mode, and produces a durable error record, an
//! optional sampled error event, and the fixed error-rate metric set.
//!
//! ```
//! use std::fmt;
//! use watchtower::agent::Agent;
//! use watchtower::classify::Noticeable;
//! use watchtower::config::AgentConfig;
//!
//! #[derive(Debug)]
//! struct PaymentFailed;
//!
//! impl fmt::Display for PaymentFailed {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "payment gateway unreachable")
//!     }
//! }
//!
//! impl Noticeable for PaymentFailed {}
//!
//! let agent = Agent::new(AgentConfig::default());
//! let txn = agent.start_web_transaction("checkout", "/checkout");
//! txn.notice_error(PaymentFailed).expect("capture");
//! txn.end();
//!
//! let record = txn.error_record().expect("record");
//! assert_eq!(record.class, "watchtower.PaymentFailed");
//! ```

pub mod agent;
pub mod classify;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod policy;
pub mod record;
pub mod stack;
pub mod transaction;
