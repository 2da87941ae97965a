//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the store directory to an absolute path
//! 2. Reads or runs one transaction against the store
//! 3. Formats and displays output
//!
//! Mutating handlers go through [`transact`], which commits only when the
//! edit reports a change and abandons the transaction otherwise.

mod completion;
mod config_cmd;
mod edit;
mod init;
mod pointer;
mod show;
mod status;

pub use completion::completion;
pub use config_cmd::config;
pub use edit::{remove, replace, set};
pub use init::init;
pub use show::{info, show};
pub use status::status;

use std::path::Path;

use anyhow::{Context as _, Result};
use serde_json::Value;

use crate::cli::args::Command;
use crate::cli::Context;
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { dir, file, force } => init::init(ctx, &dir, file.as_deref(), force),
        Command::Show { dir, pointer } => show::show(ctx, &dir, pointer.as_deref()),
        Command::Info { dir } => show::info(ctx, &dir),
        Command::Set {
            dir,
            pointer,
            value,
        } => edit::set(ctx, &dir, &pointer, &value),
        Command::Remove { dir, pointer } => edit::remove(ctx, &dir, &pointer),
        Command::Replace { dir, file } => edit::replace(ctx, &dir, &file),
        Command::Status { dir } => status::status(ctx, &dir),
        Command::Config => config_cmd::config(ctx),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Outcome of a transactional edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    Unchanged,
}

/// Run `edit` inside a transaction on the store in `dir`.
///
/// `edit` returns whether it changed the payload. Changes are committed;
/// an unchanged payload or a failed edit abandons the transaction.
///
/// A commit whose only failure is the final directory sync counts as
/// committed: the new document is live, so a warning is printed instead of
/// failing the command.
pub fn transact<F>(ctx: &Context, dir: &Path, edit: F) -> Result<Outcome>
where
    F: FnOnce(&mut Value) -> Result<bool>,
{
    let store = ctx.store(dir)?;
    output::debug(
        format!("opening transaction in {}", store.paths().dir().display()),
        ctx.verbosity,
    );
    let (mut payload, committer) = store
        .open::<Value>()
        .context("could not open database")?;

    let changed = match edit(&mut payload) {
        Ok(changed) => changed,
        Err(err) => {
            // The edit error is the one worth reporting.
            let _ = committer.abandon();
            return Err(err);
        }
    };

    if changed {
        match committer.commit(Some(&payload)) {
            Ok(()) => {}
            Err(err) if err.is_committed() => {
                output::warn(
                    format!("changes committed, but durability not confirmed: {}", err),
                    ctx.verbosity,
                );
            }
            Err(err) => return Err(err).context("could not commit changes to database"),
        }
        tracing::debug!(dir = %store.paths().dir().display(), "transaction committed");
        output::debug("transaction committed", ctx.verbosity);
        Ok(Outcome::Committed)
    } else {
        committer.abandon().context("could not close database")?;
        output::debug("transaction abandoned; payload unchanged", ctx.verbosity);
        Ok(Outcome::Unchanged)
    }
}
