//! Telemetry initialization.
//!
//! Events go to stderr through `tracing-subscriber`, filtered by `RUST_LOG`
//! (default `warn`). `OME_LOG_FORMAT` picks the encoding:
//! - unset or `"text"` → human-readable lines
//! - `"json"` → one JSON object per event, with span close events

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable selecting the log encoding.
pub const LOG_FORMAT_ENV: &str = "OME_LOG_FORMAT";

/// Install the global subscriber. Call once, first thing in `main()`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("warning: could not install log subscriber: {e}");
    }
}
