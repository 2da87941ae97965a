//! set / remove / replace commands - transactional edits of the payload

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde_json::Value;

use super::{pointer, transact, Outcome};
use crate::cli::Context;
use crate::ui::output;

/// Set the value at `ptr` to the JSON `raw`.
pub fn set(ctx: &Context, dir: &Path, ptr: &str, raw: &str) -> Result<()> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("'{}' is not valid JSON", raw))?;
    let outcome = transact(ctx, dir, |doc| pointer::set(doc, ptr, value))?;
    report(ctx, outcome, &format!("set {}", display_pointer(ptr)));
    Ok(())
}

/// Remove the value at `ptr`.
pub fn remove(ctx: &Context, dir: &Path, ptr: &str) -> Result<()> {
    let outcome = transact(ctx, dir, |doc| pointer::remove(doc, ptr))?;
    report(ctx, outcome, &format!("removed {}", display_pointer(ptr)));
    Ok(())
}

/// Replace the whole payload with the contents of `file`.
pub fn replace(ctx: &Context, dir: &Path, file: &Path) -> Result<()> {
    let new = read_json_file(file)?;
    let outcome = transact(ctx, dir, |doc| {
        if *doc == new {
            return Ok(false);
        }
        *doc = new;
        Ok(true)
    })?;
    report(ctx, outcome, "replaced payload");
    Ok(())
}

/// Parse a JSON file supplied on the command line.
pub(super) fn read_json_file(file: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", file.display()))
}

fn display_pointer(ptr: &str) -> &str {
    if ptr.is_empty() {
        "payload"
    } else {
        ptr
    }
}

fn report(ctx: &Context, outcome: Outcome, done: &str) {
    match outcome {
        Outcome::Committed => output::success(done, ctx.verbosity),
        Outcome::Unchanged => output::warn("no changes; nothing written", ctx.verbosity),
    }
}
