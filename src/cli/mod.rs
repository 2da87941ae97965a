//! cli
//!
//! Command-line interface layer for Coffer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and build the command context
//! - Delegate to command handlers
//! - Map failures to messages and exit codes
//!
//! # Exit Codes
//!
//! - `0` - success
//! - `1` - any failure other than contention
//! - `75` - a transaction is already in progress; try again

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::core::store::{Store, StoreError};
use crate::logging;
use crate::ui::output::{self, Verbosity};

/// Exit code reported when the store is locked by another transaction.
pub const EXIT_CONTENDED: u8 = 75;

/// Settings shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    /// Base for relative store directories (defaults to the process cwd)
    pub cwd: Option<PathBuf>,
    pub verbosity: Verbosity,
    pub config: Config,
}

impl Context {
    /// Resolve `dir` to an absolute path.
    ///
    /// Transactions must not depend on the working directory staying put.
    pub fn resolve_dir(&self, dir: &Path) -> Result<PathBuf> {
        let joined = match &self.cwd {
            Some(cwd) => cwd.join(dir),
            None => dir.to_path_buf(),
        };
        std::path::absolute(&joined)
            .with_context(|| format!("resolve store directory {}", joined.display()))
    }

    /// Build a store handle for `dir` using the loaded configuration.
    pub fn store(&self, dir: &Path) -> Result<Store> {
        let store = Store::new(self.resolve_dir(dir)?)?
            .with_retry_policy(self.config.retry_policy())
            .with_record_user(self.config.record_user());
        Ok(store)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init(cli.debug);

    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    let result = Config::load()
        .context("could not load configuration")
        .and_then(|config| {
            match config.loaded_from() {
                Some(path) => output::debug(
                    format!("loaded configuration from {}", path.display()),
                    verbosity,
                ),
                None => output::debug("no configuration file; using defaults", verbosity),
            }
            let ctx = Context {
                cwd: cli.cwd.clone(),
                verbosity,
                config,
            };
            commands::dispatch(cli.command, &ctx)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            let code = exit_code(&err);
            if code == EXIT_CONTENDED {
                output::hint("a transaction is already in progress; try again");
            }
            ExitCode::from(code)
        }
    }
}

/// Exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let contended = err
        .chain()
        .filter_map(|e| e.downcast_ref::<StoreError>())
        .any(StoreError::is_contention);
    if contended {
        EXIT_CONTENDED
    } else {
        1
    }
}
