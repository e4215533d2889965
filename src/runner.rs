//! Launching borg.
//!
//! Operations describe what borg should do as an [`Invocation`]; the
//! [`Runner`] turns that into a concrete child process:
//!
//! 1. writes the passphrase to a [`PasswordFile`] and points
//!    `BORG_PASSCOMMAND` at it,
//! 2. echoes `$ cd <workdir>` and `$ borg <args…>`,
//! 3. hands the process to a [`Launcher`] unless this is a dry run.
//!
//! The working directory is a property of the child process.  sftbackup
//! never changes its own current directory.

use std::{path::PathBuf, process::Command};

#[cfg(test)]
use mockall::automock;

use crate::{
    error::{Error, Result},
    password::{PASSCOMMAND_ENV, PasswordFile},
    ui,
};

/// The backup tool.
pub const BORG: &str = "borg";

// ─── Invocation ───────────────────────────────────────────────────────────────

/// borg arguments plus the directory borg should run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            workdir: None,
        }
    }

    /// Run borg inside `dir`.  Relative archive paths resolve against it.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// `borg <args…>` as echoed to the terminal.
    pub fn command_line(&self) -> String {
        std::iter::once(BORG)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ─── Launcher ─────────────────────────────────────────────────────────────────

/// A fully specified child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub workdir: Option<PathBuf>,
}

/// Starts a process and waits for it.  A non-zero exit is an error.
#[cfg_attr(test, automock)]
pub trait Launcher {
    fn launch(&self, spec: &ProcessSpec) -> Result<()>;
}

/// Launches real processes that inherit stdin, stdout and stderr.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, spec: &ProcessSpec) -> Result<()> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd.envs(spec.env.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = &spec.workdir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|source| Error::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                program: spec.program.clone(),
                status,
            })
        }
    }
}

// ─── Runner ───────────────────────────────────────────────────────────────────

pub struct Runner<L: Launcher = SystemLauncher> {
    launcher: L,
    dryrun: bool,
}

impl Runner<SystemLauncher> {
    pub fn new(dryrun: bool) -> Self {
        Self::with_launcher(SystemLauncher, dryrun)
    }
}

impl<L: Launcher> Runner<L> {
    pub fn with_launcher(launcher: L, dryrun: bool) -> Self {
        Self { launcher, dryrun }
    }

    pub fn dryrun(&self) -> bool {
        self.dryrun
    }

    /// Run borg with `password` supplied through a temporary password file.
    ///
    /// With `dryrun` the password file is still written (and removed) and
    /// the commands are still echoed; only the launch is skipped.
    pub fn run(&self, invocation: &Invocation, password: &str) -> Result<()> {
        let pwfile = PasswordFile::create(password)?;
        log::debug!("password file written to {}", pwfile.path().display());
        let spec = ProcessSpec {
            program: BORG.into(),
            args: invocation.args.clone(),
            env: vec![(PASSCOMMAND_ENV.into(), pwfile.passcommand())],
            workdir: invocation.workdir.clone(),
        };

        if let Some(dir) = &invocation.workdir {
            ui::echo(&format!("cd {}", dir.display()));
        }
        ui::echo(&invocation.command_line());

        if self.dryrun {
            log::debug!("dry run, not launching {BORG}");
            return Ok(());
        }

        self.launcher.launch(&spec)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
