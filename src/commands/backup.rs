//! `sftbackup backup` — archive the live filesystem or the latest snapper
//! snapshot with `borg create`.
//!
//! # Steps
//!
//! | # | Step      | Description                                              |
//! |---|-----------|----------------------------------------------------------|
//! | 1 | Password  | Resolve `[archive] password`                             |
//! | 2 | Source    | Latest root snapshot if `[snapper] active`, else rootdir |
//! | 3 | Name      | `snapshot-<id>-<date>` / `snapshot-<now>` / `--override` |
//! | 4 | Create    | `borg create` inside the source directory                |
//! | 5 | Prune     | `borg prune` when `[backup] prune_old = true`            |
//!
//! borg runs inside the source directory and gets paths relative to `/`, so
//! archives made from a snapshot look exactly like archives of the live
//! system.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};

use crate::{
    commands::prune,
    config::{BackupConfig, Config},
    error::Result,
    password,
    runner::{Invocation, Launcher, Runner},
    snapper::{self, SnapshotLister},
    ui,
};

/// Always excluded, relative to the backup root.
pub const BASELINE_EXCLUDES: [&str; 7] = [
    "home/*/.cache/*",
    "var/tmp/*",
    "tmp/*",
    "var/cache/*",
    "proc/*",
    "sys/*",
    "dev/*",
];

/// Seconds between borg checkpoints, so an interrupted run can be resumed.
const CHECKPOINT_INTERVAL: &str = "600";

/// Where the archive comes from and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSource {
    pub name: String,
    pub dir: PathBuf,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Create an archive, then prune if configured.
///
/// `name_override` replaces the computed archive name, which is how an
/// interrupted backup is resumed under its original name.
pub fn run<L: Launcher, S: SnapshotLister>(
    cfg: &Config,
    runner: &Runner<L>,
    lister: &S,
    name_override: Option<&str>,
) -> Result<()> {
    run_at(
        cfg,
        runner,
        lister,
        name_override,
        Local::now().naive_local(),
        ui::stdout_is_terminal(),
    )
}

fn run_at<L: Launcher, S: SnapshotLister>(
    cfg: &Config,
    runner: &Runner<L>,
    lister: &S,
    name_override: Option<&str>,
    now: NaiveDateTime,
    progress: bool,
) -> Result<()> {
    let archive = cfg.archive()?;
    let password = password::resolve(&archive.password)?;

    let mut source = find_source(cfg, lister, now)?;
    if let Some(name) = name_override {
        log::info!("using archive name {name} instead of {}", source.name);
        source.name = name.to_owned();
    }

    let args = build_create_args(&archive.repo, &cfg.backup, &source.name, progress);
    runner.run(&Invocation::new(args).in_dir(source.dir), &password)?;

    if cfg.backup.prune_old {
        prune::run(cfg, runner)?;
    }

    Ok(())
}

// ─── Source selection ─────────────────────────────────────────────────────────

/// Pick the directory to archive and the archive name.
///
/// With an active `[snapper]` section this is the snapshot with the highest
/// id; finding none is an error rather than a silent fallback to the live
/// filesystem.
pub fn find_source<S: SnapshotLister>(
    cfg: &Config,
    lister: &S,
    now: NaiveDateTime,
) -> Result<BackupSource> {
    let Some(snapper_cfg) = cfg.active_snapper() else {
        return Ok(BackupSource {
            name: format!("snapshot-{}", snapper::isoformat(&now)),
            dir: cfg.backup.rootdir.clone(),
        });
    };

    ui::announce("figuring out latest snapper snapshot...");
    let snapshots = lister.list()?;
    let latest = snapper::latest(&snapshots)?;
    let name = latest.archive_name()?;
    ui::announce(&format!("found latest snapper snapshot: {name}"));

    Ok(BackupSource {
        name,
        dir: latest.directory(&cfg.backup.rootdir, &snapper_cfg.snapdir),
    })
}

// ─── Argument builders ────────────────────────────────────────────────────────

/// Baseline excludes followed by the configured ones.
pub fn excludes(backup: &BackupConfig) -> Vec<String> {
    BASELINE_EXCLUDES
        .iter()
        .map(|e| (*e).to_owned())
        .chain(backup.exclude.iter().cloned())
        .collect()
}

/// Arguments for `borg create … <repo>::<name> <paths…>`.
///
/// `progress` adds `--progress`, which only makes sense on a terminal.
pub fn build_create_args(
    repo: &str,
    backup: &BackupConfig,
    name: &str,
    progress: bool,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "create".into(),
        "--one-file-system".into(),
        "--stats".into(),
        "--exclude-caches".into(),
        "--show-rc".into(),
        "--checkpoint-interval".into(),
        CHECKPOINT_INTERVAL.into(),
        "--compression".into(),
        backup.compress.clone(),
    ];
    if progress {
        args.push("--progress".into());
    }
    for exclude in excludes(backup) {
        args.extend(["--exclude".into(), exclude]);
    }
    args.push(format!("{repo}::{name}"));
    args.extend(backup.paths.iter().cloned());
    args
}

// ─── Tests ────────────────────────────────────────────────────────────────────
