//! `sftbackup init` — create a new borg repository in repokey mode.

use crate::{
    config::{ArchiveConfig, Config},
    error::Result,
    password,
    runner::{Invocation, Launcher, Runner},
};

/// Arguments for `borg init --encryption repokey <repo>`.
pub fn build_init_args(archive: &ArchiveConfig) -> Vec<String> {
    vec![
        "init".into(),
        "--encryption".into(),
        "repokey".into(),
        archive.repo.clone(),
    ]
}

pub fn run<L: Launcher>(cfg: &Config, runner: &Runner<L>) -> Result<()> {
    let archive = cfg.archive()?;
    let password = password::resolve(&archive.password)?;

    runner.run(&Invocation::new(build_init_args(archive)), &password)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{config::parse_config, error::Error, runner::MockLauncher};

    fn cfg(text: &str) -> Config {
        parse_config(text, Path::new("test.cfg")).unwrap()
    }

    #[test]
    fn snapshot_init_args() {
        let archive = ArchiveConfig {
            repo: "ssh://borg@nas/./host".into(),
            password: "pw".into(),
        };
        insta::assert_debug_snapshot!(build_init_args(&archive), @r#"
        [
            "init",
            "--encryption",
            "repokey",
            "ssh://borg@nas/./host",
        ]
        "#);
    }

    #[test]
    fn init_runs_borg_without_workdir() {
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().times(1).returning(|spec| {
            assert_eq!(spec.args, vec!["init", "--encryption", "repokey", "/srv/borg"]);
            assert!(spec.workdir.is_none());
            Ok(())
        });

        let cfg = cfg("[archive]\nrepo = /srv/borg\npassword = pw\n");
        run(&cfg, &Runner::with_launcher(launcher, false)).unwrap();
    }

    #[test]
    fn init_requires_archive_section() {
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().never();

        let err = run(&cfg("[prune]\n"), &Runner::with_launcher(launcher, false)).unwrap_err();
        assert!(matches!(err, Error::MissingSection("archive")));
    }

    #[test]
    fn init_ignores_bad_retention_counts() {
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().times(1).returning(|_| Ok(()));

        let cfg = cfg("[archive]\nrepo = r\npassword = p\n[prune]\nkeep_daily = x\n");
        run(&cfg, &Runner::with_launcher(launcher, false)).unwrap();
    }
}
