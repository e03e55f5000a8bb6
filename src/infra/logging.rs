//! Logging initialization.
//!
//! Provides a single initialization point for the tracing subscriber. `RUST_LOG` overrides
//! the default filter.

use crate::infra::config::LogFormat;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "snippets_api=info,api_server=info,preflight=info,tower_http=info";

static INIT_ONCE: Once = Once::new();

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(format: LogFormat) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let result = match format {
            LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .try_init(),
        };
        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = result;
    });
}
