//! Demonstrates logging setup across the available output formats.
//!
//! Run with:
//!
//! ```sh
//! cargo run -p core-runtime --example logging_demo -- pretty
//! cargo run -p core-runtime --example logging_demo -- json
//! cargo run -p core-runtime --example logging_demo -- compact
//! ```

use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use tracing::{debug, error, info, span, warn, Level};

fn main() {
    let format = match std::env::args().nth(1).as_deref() {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") | None => LogFormat::Pretty,
        Some(other) => {
            eprintln!("unknown format '{other}', expected pretty | json | compact");
            std::process::exit(1);
        }
    };

    let config = LoggingConfig::default()
        .with_format(format)
        .with_level(Level::DEBUG);

    if let Err(e) = init_logging(&config) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    info!(?format, "logging initialized");

    // Emit the kind of output a sync cycle produces.
    let cycle = span!(Level::INFO, "sync_cycle", trigger = "manual");
    let _guard = cycle.enter();

    debug!(changed_kinds = 2, "local changes detected since last sync");
    info!(records = 17, "uploading snapshot");
    warn!(attempt = 2, delay_ms = 2000, status = 503, "retrying after server error");
    info!(duration_ms = 840, "sync completed");
    drop(_guard);

    error!(status = 401, "example of a terminal failure log line");
}
