//! Logging initialization.
//!
//! The library only emits `tracing` events; binaries and tests that want to see
//! them call [`init`] once at startup.

use std::sync::Once;

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output at debug level.
    Development,
    /// JSON output at info level.
    Production,
    /// Registry with no output layer.
    Test,
}

impl Profile {
    const fn default_filter(self) -> &'static str {
        match self {
            Self::Development => "rtdbql=debug",
            Self::Production => "rtdbql=info",
            Self::Test => "off",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber for `profile`. `RUST_LOG` overrides the
/// profile's filter. Later calls are no-ops, as is a call made after another
/// global subscriber was installed.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(profile.default_filter()))
        };
        // Another subscriber may already be installed; keep it.
        let _installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(filter())
                .try_init()
                .is_ok(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter())
                .try_init()
                .is_ok(),
            Profile::Test => tracing_subscriber::registry().try_init().is_ok(),
        };
    });
}
