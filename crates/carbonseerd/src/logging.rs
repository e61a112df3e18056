//! Tracing initialization.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,carbonseerd=debug,carbonseer=debug";

/// Install the global subscriber. `json` switches to one JSON object per
/// event.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
