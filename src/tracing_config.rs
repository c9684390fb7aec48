//! Tracing subscriber configuration for the CLI
//!
//! The library only emits trace events; the application configures the
//! subscriber. `RUST_LOG` overrides the verbosity-derived filter.

#[cfg(feature = "cli")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Tracing configuration for console output
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Verbosity level (0 = info, 1 = debug, 2+ = trace)
    pub verbosity: u8,
    /// Disable ANSI colors (CI-friendly output)
    pub plain: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            plain: false,
        }
    }
}

impl TracingConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the verbosity level
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Disable colored output
    #[must_use]
    pub fn with_plain_output(mut self, plain: bool) -> Self {
        self.plain = plain;
        self
    }

    /// Map the verbosity level onto a filter directive
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Install the global subscriber. `RUST_LOG` wins over the configured
    /// verbosity when set.
    ///
    /// # Errors
    /// - Invalid `RUST_LOG` directive
    /// - A global subscriber is already installed
    #[cfg(feature = "cli")]
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt;

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.verbosity_to_filter()))?;

        let fmt_layer = fmt::layer()
            .with_ansi(!self.plain)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .compact();

        Registry::default().with(filter).with(fmt_layer).try_init()?;
        Ok(())
    }
}

/// Initialize tracing for the interactive CLI with default settings
///
/// # Errors
/// - Subscriber installation failures
#[cfg(feature = "cli")]
pub fn init_cli_tracing() -> anyhow::Result<()> {
    TracingConfig::new().init()
}
