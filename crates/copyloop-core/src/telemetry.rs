//! Log output for the copyloop binary.
//!
//! Generated copy is printed on stdout, so every log line goes to stderr.
//! `RUST_LOG` wins when set; otherwise [`default_directives`] applies.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. The HTTP stack stays at `info`
/// even under `-v` so request plumbing does not drown the loop events.
pub fn default_directives(level: Level) -> String {
    format!(
        "{},hyper=info,reqwest=info",
        level.as_str().to_lowercase()
    )
}

/// Install the global subscriber. Later calls leave the first one in place.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let plain = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });
    let structured = json.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(structured)
        .try_init();
}
