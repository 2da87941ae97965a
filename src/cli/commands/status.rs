//! status command - report whether a transaction is in progress

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::lock::DirLock;
use crate::ui::output;

/// Probe the store lock once and report what was found.
pub fn status(ctx: &Context, dir: &Path) -> Result<()> {
    let store = ctx.store(dir)?;
    let paths = store.paths();

    if !paths.data_path().exists() {
        output::data(format!("{}: not initialized", paths.dir().display()));
        return Ok(());
    }

    let probe = DirLock::try_acquire(&paths.lock_path()).context("could not check lock")?;
    match probe {
        Some(mut lock) => {
            lock.release().context("could not release lock")?;
            output::data(format!("{}: idle", paths.dir().display()));
        }
        None => {
            output::data(format!(
                "{}: transaction in progress",
                paths.dir().display()
            ));
        }
    }
    Ok(())
}
