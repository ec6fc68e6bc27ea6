//! Logger setup backed by `tracing-subscriber`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter defaults to
/// `{bin_name}={level},tower_http={level}` so only our own crate and the HTTP
/// trace layer are verbose.
///
/// Calling this twice is harmless: the second installation is ignored.
pub fn setup_logger(bin_name: &str, level: &str) {
    let crate_name = bin_name.replace('-', "_");
    let default_filter = format!("{crate_name}={level},tower_http={level}");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .try_init();
}
