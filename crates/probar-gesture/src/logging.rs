//! Tracing subscriber setup for hosts that do not install their own.
//!
//! Filtering honors `PROBAR_GESTURE_LOG` (same syntax as `RUST_LOG`); when it
//! is unset the [`Verbosity`] picks the level for this crate and everything
//! else logs at `warn`.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::result::{GestureError, GestureResult};

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "PROBAR_GESTURE_LOG";

/// Default level for this crate's spans and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Suite and test progress
    #[default]
    Normal,
    /// Phase transitions and assertion details
    Verbose,
    /// Every dispatched event
    Trace,
}

impl Verbosity {
    /// Level name understood by `EnvFilter`
    #[must_use]
    pub const fn level(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::Trace => "trace",
        }
    }

    /// Map a `-v` count to a verbosity
    #[must_use]
    pub const fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    fn directive(self) -> String {
        format!("warn,probar_gesture={}", self.level())
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human readable
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

fn filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(verbosity.directive()))
}

/// Install a global subscriber
///
/// # Errors
///
/// Returns `InvalidState` when a global subscriber is already installed
pub fn init_tracing(verbosity: Verbosity, format: LogFormat) -> GestureResult<()> {
    let registry = tracing_subscriber::registry().with(filter(verbosity));
    let installed = match format {
        LogFormat::Compact => registry
            .with(fmt::layer().with_target(true).compact())
            .try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    installed.map_err(|e| GestureError::InvalidState {
        message: format!("tracing already initialized: {e}"),
    })
}
