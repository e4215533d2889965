//! Configuration types and loading logic.
//!
//! `sftbackup.cfg` is an INI file.  It is read with `rust-ini` and turned
//! into typed sections right away.  Sections that only some operations need
//! (`[archive]`, `[prune]`) are kept optional here and checked by the
//! operation that needs them.  The retention counts stay text until
//! [`Config::prune`] is asked for them, so a bad count only stops `prune`.
//!
//! # File format
//!
//! ```ini
//! [archive]
//! repo     = borg@backup.example.org:/srv/borg/myhost
//! password = /etc/sftbackup.key
//!
//! [backup]
//! compress  = auto,zstd,4
//! rootdir   = /
//! paths     = /
//! exclude   = /var/lib/docker,/home/*/Downloads
//! prune_old = true
//!
//! [prune]
//! keep_daily   = 7
//! keep_weekly  = 4
//! keep_monthly = 3
//!
//! [snapper]
//! active  = true
//! snapdir = .snapshots
//! ```
//!
//! Keys are matched case-insensitively, section names are not.

use std::path::{Component, Path, PathBuf};

use ini::{Ini, ParseOption, Properties};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

// ─── Top-level ────────────────────────────────────────────────────────────────

/// Root configuration object, built from `sftbackup.cfg`.
#[derive(Debug, Serialize, Default)]
pub struct Config {
    /// Repository location and password.  Required by every operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveConfig>,

    /// What `backup` archives.  Every key has a default, so the section is
    /// optional.
    pub backup: BackupConfig,

    /// Retention policy as written.  Required by `prune` (and by `backup`
    /// when `prune_old` is set).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prune: Option<PruneSection>,

    /// Present when the config has a `[snapper]` section at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapper: Option<SnapperConfig>,
}

// ─── [archive] ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ArchiveConfig {
    /// borg repository location, passed through verbatim.
    pub repo: String,

    /// Literal passphrase, or a path (`~`, `/` or `.` prefix) to a file
    /// holding it.  See [`crate::password::resolve`].
    #[serde(serialize_with = "redact")]
    pub password: String,
}

// ─── [backup] ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BackupConfig {
    /// Compression spec handed to `borg create --compression`.
    pub compress: String,

    /// Filesystem root to back up.  Also the base of the snapper directory.
    pub rootdir: PathBuf,

    /// Extra exclude patterns, already made relative to `/`.
    pub exclude: Vec<String>,

    /// Paths to archive, relative to `/`.
    pub paths: Vec<String>,

    /// Run `prune` right after a successful backup.
    pub prune_old: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            compress: default_compress(),
            rootdir: PathBuf::from("/"),
            exclude: vec![],
            paths: split_paths("/"),
            prune_old: false,
        }
    }
}

// ─── [prune] ──────────────────────────────────────────────────────────────────

/// `[prune]` keys exactly as found in the file.
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct PruneSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_daily: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_weekly: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_monthly: Option<String>,
}

/// How many archives `borg prune` keeps per window.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PruneConfig {
    pub keep_daily: u32,
    pub keep_weekly: u32,
    pub keep_monthly: u32,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            keep_daily: 7,
            keep_weekly: 4,
            keep_monthly: 3,
        }
    }
}

// ─── [snapper] ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SnapperConfig {
    /// Back up the latest snapper snapshot instead of the live filesystem.
    pub active: bool,

    /// Snapshot directory below `rootdir`.
    pub snapdir: PathBuf,
}

impl Default for SnapperConfig {
    fn default() -> Self {
        Self {
            active: false,
            snapdir: PathBuf::from(".snapshots"),
        }
    }
}

// ─── Accessors ────────────────────────────────────────────────────────────────

impl Config {
    /// The `[archive]` section, or an error naming it.
    pub fn archive(&self) -> Result<&ArchiveConfig> {
        self.archive.as_ref().ok_or(Error::MissingSection("archive"))
    }

    /// Retention counts from `[prune]`, with defaults for absent keys.
    ///
    /// Fails if the section is missing or a count is not a number.
    pub fn prune(&self) -> Result<PruneConfig> {
        let section = self.prune.as_ref().ok_or(Error::MissingSection("prune"))?;
        let defaults = PruneConfig::default();
        let keep = |key, value: &Option<String>, default| count(key, value.as_deref(), default);
        Ok(PruneConfig {
            keep_daily: keep("keep_daily", &section.keep_daily, defaults.keep_daily)?,
            keep_weekly: keep("keep_weekly", &section.keep_weekly, defaults.keep_weekly)?,
            keep_monthly: keep("keep_monthly", &section.keep_monthly, defaults.keep_monthly)?,
        })
    }

    /// The `[snapper]` section if snapshots should be used for backups.
    pub fn active_snapper(&self) -> Option<&SnapperConfig> {
        self.snapper.as_ref().filter(|s| s.active)
    }

    /// Build typed sections from an already parsed INI document.
    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let archive = ini
            .section(Some("archive"))
            .map(|props| {
                Ok::<_, Error>(ArchiveConfig {
                    repo: require(props, "archive", "repo")?.to_owned(),
                    password: require(props, "archive", "password")?.to_owned(),
                })
            })
            .transpose()?;

        let mut backup = BackupConfig::default();
        if let Some(props) = ini.section(Some("backup")) {
            if let Some(compress) = get(props, "compress") {
                backup.compress = compress.to_owned();
            }
            if let Some(rootdir) = get(props, "rootdir") {
                backup.rootdir = PathBuf::from(rootdir);
            }
            if let Some(exclude) = get(props, "exclude") {
                backup.exclude = split_paths(exclude);
            }
            if let Some(paths) = get(props, "paths") {
                backup.paths = split_paths(paths);
            }
            backup.prune_old = get(props, "prune_old").is_some_and(is_true);
        }

        let prune = ini.section(Some("prune")).map(|props| {
            if get(props, "active").is_some() {
                log::warn!(
                    "[prune] active is ignored, set prune_old = true in [backup] to prune after \
                     every backup"
                );
            }
            let raw = |key: &str| get(props, key).map(str::to_owned);
            PruneSection {
                keep_daily: raw("keep_daily"),
                keep_weekly: raw("keep_weekly"),
                keep_monthly: raw("keep_monthly"),
            }
        });

        let snapper = ini.section(Some("snapper")).map(|props| {
            let mut snapper = SnapperConfig::default();
            snapper.active = get(props, "active").is_some_and(is_true);
            if let Some(snapdir) = get(props, "snapdir") {
                snapper.snapdir = PathBuf::from(snapdir);
            }
            snapper
        });

        Ok(Self {
            archive,
            backup,
            prune,
            snapper,
        })
    }
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub fn default_compress() -> String {
    "auto,zstd,4".into()
}

// ─── Value helpers ────────────────────────────────────────────────────────────

/// `true` for any capitalisation of `"true"`, `false` for everything else.
pub fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Split a comma-separated path list and make every entry relative to `/`.
///
/// Blank entries are dropped, order is preserved.
pub fn split_paths(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(relative_to_root)
        .collect()
}

/// Lexically normalise `path` and strip its root, e.g. `/b/` → `b`,
/// `/var/./log/../tmp` → `var/tmp`.  `/` itself becomes `.`.
pub fn relative_to_root(path: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            },
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {},
        }
    }

    if parts.is_empty() {
        ".".into()
    } else {
        parts.join("/")
    }
}

fn get<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    props
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim())
}

fn require<'a>(props: &'a Properties, section: &'static str, key: &'static str) -> Result<&'a str> {
    get(props, key).ok_or(Error::MissingKey { section, key })
}

fn count(key: &'static str, value: Option<&str>, default: u32) -> Result<u32> {
    match value {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| Error::InvalidNumber {
            section: "prune",
            key,
            value: value.to_owned(),
        }),
    }
}

fn redact<S: Serializer>(_: &String, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str("<redacted>")
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Parse config text.  `path` is only used in error messages.
///
/// Backslash escapes and quote stripping are turned off so Windows-style
/// paths and passphrases containing quotes survive unchanged.
pub fn parse_config(text: &str, path: &Path) -> Result<Config> {
    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(text, opt).map_err(|source| Error::ConfigParse {
        path: path.to_owned(),
        source,
    })?;
    Config::from_ini(&ini)
}

/// Read and parse the config file at `path`.
///
/// Unlike a missing section, a missing file is always an error: there are
/// no usable defaults for the repository or the password.
pub fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_owned(),
        source,
    })?;
    log::debug!("loaded config from {}", path.display());
    parse_config(&text, path)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
