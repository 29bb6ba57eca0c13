//! Diagnostic logging for the embedded agent.
//!
//! The agent lives inside someone else's process, so its own diagnostics
//! go to stderr and stay quiet unless asked: the monitored application
//! owns stdout, and the pipeline itself only emits debug-level lines.
//! Verbosity is controlled via `RUST_LOG` or programmatically.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Log level for agent diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything, including per-notification pipeline steps.
    Trace,
    /// Capture/reject decisions and policy swaps.
    Debug,
    /// Lifecycle messages only.
    Info,
    /// Problems the agent can work around.
    #[default]
    Warn,
    /// Problems the agent cannot work around.
    Error,
    /// No agent output at all.
    Off,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            // Off is handled by the filter directive, not the level.
            LogLevel::Error | LogLevel::Off => Level::ERROR,
        }
    }
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Configuration for agent diagnostics.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level emitted when `RUST_LOG` is not set.
    pub level: LogLevel,
    /// Include timestamps in each line.
    pub with_timestamps: bool,
    /// Include the module path in each line.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            with_timestamps: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Quiet defaults: warnings only, timestamps and targets on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Toggle timestamps.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }

    /// Toggle the module-path target.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }
}

/// Install the agent's diagnostic subscriber.
///
/// Call once, early in the host process. `RUST_LOG` takes precedence over
/// the configured level so operators can raise verbosity without a
/// redeploy.
///
/// # Examples
///
/// ```no_run
/// use watchtower::logging::{init_logging, LogLevel, LoggingConfig};
///
/// init_logging(LoggingConfig::new().with_level(LogLevel::Debug));
/// ```
pub fn init_logging(config: LoggingConfig) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.level.directive())
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(config.with_target);

    if config.with_timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
