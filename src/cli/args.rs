//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Resolve relative store directories against this path
//! - `--debug`: Enable debug logging and progress notes
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Coffer - a single-writer transactional document store
#[derive(Parser, Debug)]
#[command(name = "coffer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Resolve relative store directories against this path
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging and progress notes
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a store with an initial document
    #[command(
        name = "init",
        long_about = "Create a store with an initial document.\n\n\
            Writes the live document directly, without taking the lock. The \
            directory is created if it does not exist. The payload is an empty \
            JSON object unless --file is given.",
        after_help = "\
EXAMPLES:
    # Start an empty store
    coffer init /srv/c1

    # Seed the store from a file
    coffer init /srv/c1 --file roster.json

    # Start over, discarding the current document
    coffer init /srv/c1 --force"
    )]
    Init {
        /// Store directory
        dir: PathBuf,

        /// Read the initial payload from this JSON file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Replace an existing document
        #[arg(long)]
        force: bool,
    },

    /// Print the current payload
    #[command(
        name = "show",
        long_about = "Print the current payload as pretty JSON.\n\n\
            Reads without taking the lock; the output is always a complete \
            document, even while a transaction is committing."
    )]
    Show {
        /// Store directory
        dir: PathBuf,

        /// Print only the value at this JSON pointer (e.g. /students/0)
        #[arg(long)]
        pointer: Option<String>,
    },

    /// Print who last wrote the document, and when
    #[command(name = "info")]
    Info {
        /// Store directory
        dir: PathBuf,
    },

    /// Set the value at a JSON pointer
    #[command(
        name = "set",
        long_about = "Set the value at a JSON pointer inside a transaction.\n\n\
            The final object key is created if missing; '-' appends to an array. \
            Nothing is written if the value is already present.",
        after_help = "\
EXAMPLES:
    # Add a student
    coffer set /srv/c1 /students/- '\"u1\"'

    # Record a grade
    coffer set /srv/c1 /grades/hw1/u1 '93.5'"
    )]
    Set {
        /// Store directory
        dir: PathBuf,

        /// JSON pointer to set (empty string for the whole payload)
        pointer: String,

        /// New value as JSON
        #[arg(allow_negative_numbers = true)]
        value: String,
    },

    /// Remove the value at a JSON pointer
    #[command(name = "remove")]
    Remove {
        /// Store directory
        dir: PathBuf,

        /// JSON pointer to remove
        pointer: String,
    },

    /// Replace the whole payload
    #[command(name = "replace")]
    Replace {
        /// Store directory
        dir: PathBuf,

        /// JSON file holding the new payload
        #[arg(long)]
        file: PathBuf,
    },

    /// Report whether a transaction is in progress
    #[command(name = "status")]
    Status {
        /// Store directory
        dir: PathBuf,
    },

    /// Print the effective configuration
    #[command(name = "config")]
    Config,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    coffer completion bash > ~/.local/share/bash-completion/completions/coffer

    # Zsh
    coffer completion zsh > ~/.zfunc/_coffer"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_set_with_global_flags() {
        let cli = Cli::try_parse_from(["coffer", "set", "c1", "/a", "1", "--quiet"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Command::Set {
                dir,
                pointer,
                value,
            } => {
                assert_eq!(dir, PathBuf::from("c1"));
                assert_eq!(pointer, "/a");
                assert_eq!(value, "1");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn set_accepts_negative_number() {
        let cli = Cli::try_parse_from(["coffer", "set", "c1", "/grade", "-1"]).unwrap();
        match cli.command {
            Command::Set { value, .. } => assert_eq!(value, "-1"),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["coffer", "set", "c1", "/grade", "-2.5e1", "--quiet"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn replace_requires_file() {
        assert!(Cli::try_parse_from(["coffer", "replace", "c1"]).is_err());
    }
}
