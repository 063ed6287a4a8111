// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Sets up the logging framework using tracing_subscriber.
/// `RUST_LOG` wins when set; otherwise `debug` turns on this crate's debug
/// output and everything else stays at "info".
pub fn setup_logging(debug: bool) {
    let fallback = if debug { "info,swehockey_stats=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout is reserved for --stdout records
        .init();

    tracing::debug!("Logging setup complete.");
}
