//! `sftbackup` — borg backups driven by `/etc/sftbackup.cfg`.
//!
//! # Overview
//!
//! This binary is a thin orchestration layer around [borg](https://www.borgbackup.org).
//! It turns an INI config into `borg init`, `borg create` and `borg prune`
//! invocations.  With `[snapper] active = true` it backs up the latest
//! snapper snapshot instead of the live filesystem, so the archive is
//! consistent even while the system keeps running.
//!
//! # Usage
//!
//! ```text
//! sftbackup init                      # create the borg repository
//! sftbackup backup                    # archive / or the latest snapshot
//! sftbackup backup --override NAME    # resume an interrupted archive
//! sftbackup prune                     # apply the retention policy
//! sftbackup --dryrun backup           # print the commands, run nothing
//! sftbackup --print-config            # show the parsed config
//! ```
//!
//! # Module layout
//!
//! | Module                   | Responsibility                              |
//! |--------------------------|---------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap               |
//! | [`config`]               | INI loader and typed sections               |
//! | [`error`]                | Error enum shared by all modules            |
//! | [`password`]             | Password resolution, temp password file     |
//! | [`snapper`]              | `snapper list` parsing, latest snapshot     |
//! | [`runner`]               | borg process launching, dry run             |
//! | [`ui`]                   | Command echo, spinner, captured execution   |
//! | [`commands::init`]       | `init` subcommand                           |
//! | [`commands::prune`]      | `prune` subcommand                          |
//! | [`commands::backup`]     | `backup` subcommand                         |

mod cli;
mod commands;
mod config;
mod error;
mod password;
mod runner;
mod snapper;
mod ui;

use std::io;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, error::ErrorKind};
use cli::{Cli, Subcommand};
use nix::unistd::{User, geteuid};

use crate::{config::load_config, runner::Runner, snapper::Snapper};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    run(&cli).map_err(explain_permission_error)
}

fn run(cli: &Cli) -> Result<()> {
    if cli.command.is_none() && !cli.print_config {
        Cli::command()
            .error(
                ErrorKind::MissingSubcommand,
                "a subcommand is required unless --print-config is given",
            )
            .exit();
    }

    let cfg = load_config(&cli.cfg)?;

    if cli.print_config {
        let text = toml::to_string_pretty(&cfg).context("rendering config")?;
        print!("{text}");
        return Ok(());
    }

    let runner = Runner::new(cli.dryrun);
    if runner.dryrun() {
        log::info!("dry run: commands are printed, borg is not started");
    }

    match &cli.command {
        // ── sftbackup init ────────────────────────────────────────────────────
        Some(Subcommand::Init) => {
            commands::init::run(&cfg, &runner).context("init failed")?;
        },

        // ── sftbackup prune ───────────────────────────────────────────────────
        Some(Subcommand::Prune) => {
            commands::prune::run(&cfg, &runner).context("prune failed")?;
        },

        // ── sftbackup backup ──────────────────────────────────────────────────
        Some(Subcommand::Backup { r#override }) => {
            commands::backup::run(&cfg, &runner, &Snapper, r#override.as_deref())
                .context("backup failed")?;
        },

        None => {},
    }

    Ok(())
}

/// `info` by default, `debug` with `--verbose`; `RUST_LOG` wins over both.
fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Add who we are running as to errors caused by missing permissions.
///
/// Backups of `/` usually need root; when run from a timer or by hand as the
/// wrong user this is the first thing worth knowing.
fn explain_permission_error(err: anyhow::Error) -> anyhow::Error {
    let denied = err
        .chain()
        .filter_map(|e| e.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::PermissionDenied);
    if !denied {
        return err;
    }

    let uid = geteuid();
    let name = User::from_uid(uid)
        .ok()
        .flatten()
        .map(|u| u.name)
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "?".into());
    err.context(format!(
        "my permissions (uid={uid}, name={name}) couldn't do it :("
    ))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
