//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! dispatched to the handlers in [`crate::commands`].

use std::path::PathBuf;

use clap::Parser;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG: &str = "/etc/sftbackup.cfg";

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "sftbackup",
    about   = "Backups with borg, optionally from the latest snapper snapshot",
    version,
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG, global = true)]
    pub cfg: PathBuf,

    /// Print every command but do not run borg.
    ///
    /// The password is still resolved and the password file still written,
    /// so a dry run also checks that the password source works.
    #[arg(long, global = true)]
    pub dryrun: bool,

    /// Print the parsed configuration and exit without running anything.
    #[arg(long)]
    pub print_config: bool,

    /// Log debug output.  `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Subcommand>,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
pub enum Subcommand {
    /// Create a new borg repository with repokey encryption.
    Init,

    /// Remove old archives according to the [prune] retention counts.
    Prune,

    /// Create an archive of the system or of the latest snapper snapshot.
    Backup {
        /// Archive name to use instead of the generated one, e.g. to resume
        /// an interrupted backup.
        #[arg(long = "override", id = "override", value_name = "NAME")]
        r#override: Option<String>,
    },
}

// ─── Tests ────────────────────────────────────────────────────────────────────
