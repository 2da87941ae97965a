//! init command - create a store with an initial document

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde_json::Value;

use super::edit::read_json_file;
use crate::cli::Context;
use crate::ui::output;

/// Create the store in `dir`, seeded from `file` or with an empty object.
pub fn init(ctx: &Context, dir: &Path, file: Option<&Path>, force: bool) -> Result<()> {
    let payload = match file {
        Some(file) => read_json_file(file)?,
        None => Value::Object(Default::default()),
    };

    let store = ctx.store(dir)?;
    let data = store.paths().data_path();
    if data.exists() && !force {
        bail!(
            "database already exists at {}; use --force to overwrite",
            data.display()
        );
    }

    let root = store.paths().dir();
    fs::create_dir_all(root).with_context(|| format!("create {}", root.display()))?;
    store
        .init(&payload)
        .context("could not initialize database")?;

    output::success(
        format!("initialized database in {}", root.display()),
        ctx.verbosity,
    );
    Ok(())
}
