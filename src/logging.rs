//! Development-time tracing.
//!
//! Diagnostics go to stderr via `tracing`, filtered by `RUST_LOG`. They are
//! not part of the command output, which goes through [`crate::ui::output`].

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. `debug` forces the `debug` level
/// regardless of the environment.
///
/// # Example
/// ```bash
/// RUST_LOG=coffer=trace coffer set /srv/c1 /students/0 '"u1"'
/// ```
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second init (e.g. from tests driving `run`) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
