//! show / info commands - lock-free reads

use std::path::Path;

use anyhow::{Context as _, Result};
use serde_json::Value;

use super::pointer;
use crate::cli::Context;
use crate::ui::output::{self, or_unknown};

/// Print the payload, or the value at `ptr`, as pretty JSON.
pub fn show(ctx: &Context, dir: &Path, ptr: Option<&str>) -> Result<()> {
    let store = ctx.store(dir)?;
    let payload: Value = store.read().context("could not read database")?;

    let value = match ptr {
        Some(ptr) => pointer::get(&payload, ptr)?,
        None => &payload,
    };
    output::data(serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the provenance recorded with the current document.
pub fn info(ctx: &Context, dir: &Path) -> Result<()> {
    let store = ctx.store(dir)?;
    let meta = store.inspect().context("could not read database")?;

    output::data(format!("version: {}", or_unknown(meta.version)));
    output::data(format!("commit:  {}", or_unknown(meta.commit)));
    output::data(format!("uid:     {}", or_unknown(meta.uid)));
    output::data(format!("user:    {}", or_unknown(meta.user)));
    output::data(format!("time:    {}", or_unknown(meta.time)));
    Ok(())
}
