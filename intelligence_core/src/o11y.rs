//! Global tracing setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Install the global subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`). Output is JSON unless
/// `INTELLIGENCE_LOG_FORMAT=text`.
pub fn init_global_from_env() -> Result<()> {
    let text = std::env::var("INTELLIGENCE_LOG_FORMAT")
        .map(|v| v.trim().eq_ignore_ascii_case("text"))
        .unwrap_or(false);
    init_global(text)
}

pub fn init_global(text: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let res = if text {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    };
    res.map_err(|e| Error::Config(format!("tracing already initialized: {e}")))
}
