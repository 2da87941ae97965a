//! config command - print the effective configuration

use anyhow::Result;

use crate::cli::Context;
use crate::ui::output;

/// Print the effective configuration, defaults applied.
pub fn config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    let policy = config.retry_policy();

    match config.loaded_from() {
        Some(path) => output::data(format!("# loaded from {}", path.display())),
        None => output::data("# no config file found; using defaults"),
    }
    output::data(format!("lock.attempts = {}", policy.attempts));
    output::data(format!("lock.interval_ms = {}", policy.interval.as_millis()));
    output::data(format!("envelope.record_user = {}", config.record_user()));
    Ok(())
}
