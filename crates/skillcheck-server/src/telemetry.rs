//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - `SKILLCHECK_LOG` controls the filter (falls back to `RUST_LOG`, then to
//!   `DEFAULT_FILTER`).
//! - `SKILLCHECK_LOG_FORMAT` selects `pretty` (default) or `json`.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "info,skillcheck=debug,skillcheck_core=debug,skillcheck_server=debug,tower_http=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("SKILLCHECK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    // try_init: tests and embedders may have installed a subscriber already
    let result = match std::env::var("SKILLCHECK_LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
