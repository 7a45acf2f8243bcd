//! Injectable logging.
//!
//! Components take a [`Logger`] instead of reaching for a global. The stock
//! implementation, [`SiteLogger`], is quiet outside development: `info` and
//! `warn` are only emitted when [`Environment::is_development`] is set, while
//! `error` is always emitted and also handed to a [`MonitoringSink`].
//!
//! Emission goes through `tracing`; the binary installs the subscriber with
//! [`init_tracing`].

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Where the code is running. Replaces hostname sniffing at call sites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Environment {
    pub is_development: bool,
}

impl Environment {
    pub const fn development() -> Self {
        Self {
            is_development: true,
        }
    }

    pub const fn production() -> Self {
        Self {
            is_development: false,
        }
    }

    /// `localhost` is development, anything else is production.
    pub fn from_hostname(hostname: &str) -> Self {
        Self {
            is_development: hostname.eq_ignore_ascii_case("localhost"),
        }
    }
}

pub trait Logger {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str, error: Option<&dyn Error>);
}

impl<L: Logger + ?Sized> Logger for &L {
    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }

    fn error(&self, message: &str, error: Option<&dyn Error>) {
        (**self).error(message, error)
    }
}

/// Receives every error logged through a [`SiteLogger`].
pub trait MonitoringSink {
    fn capture(&self, message: &str, error: Option<&dyn Error>);
}

/// Sink for deployments without an error tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMonitoring;

impl MonitoringSink for NoMonitoring {
    fn capture(&self, _message: &str, _error: Option<&dyn Error>) {}
}

/// Environment-gated logger backed by `tracing`.
#[derive(Debug, Clone, Default)]
pub struct SiteLogger<S = NoMonitoring> {
    environment: Environment,
    sink: S,
}

impl SiteLogger<NoMonitoring> {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            sink: NoMonitoring,
        }
    }
}

impl<S: MonitoringSink> SiteLogger<S> {
    pub fn with_sink(environment: Environment, sink: S) -> Self {
        Self { environment, sink }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }
}

impl<S: MonitoringSink> Logger for SiteLogger<S> {
    fn info(&self, message: &str) {
        if self.environment.is_development {
            tracing::info!("{message}");
        }
    }

    fn warn(&self, message: &str) {
        if self.environment.is_development {
            tracing::warn!("{message}");
        }
    }

    fn error(&self, message: &str, error: Option<&dyn Error>) {
        match error {
            Some(err) => tracing::error!(error = %err, "{message}"),
            None => tracing::error!("{message}"),
        }
        self.sink.capture(message, error);
    }
}

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise development shows `debug` and up,
/// production only `warn` and up.
pub fn init_tracing(environment: Environment) {
    let default_level = if environment.is_development {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
