//! `sftbackup prune` — drop old archives according to `[prune]`.

use crate::{
    config::{Config, PruneConfig},
    error::Result,
    password,
    runner::{Invocation, Launcher, Runner},
};

/// Arguments for `borg prune --list --show-rc --keep-… <repo>`.
pub fn build_prune_args(repo: &str, keep: &PruneConfig) -> Vec<String> {
    vec![
        "prune".into(),
        "--list".into(),
        "--show-rc".into(),
        "--keep-daily".into(),
        keep.keep_daily.to_string(),
        "--keep-weekly".into(),
        keep.keep_weekly.to_string(),
        "--keep-monthly".into(),
        keep.keep_monthly.to_string(),
        repo.into(),
    ]
}

pub fn run<L: Launcher>(cfg: &Config, runner: &Runner<L>) -> Result<()> {
    let archive = cfg.archive()?;
    let keep = cfg.prune()?;
    let password = password::resolve(&archive.password)?;

    runner.run(
        &Invocation::new(build_prune_args(&archive.repo, &keep)),
        &password,
    )
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
    fn keep_flags_are_in_daily_weekly_monthly_order() {
        let keep = PruneConfig {
            keep_daily: 10,
            keep_weekly: 2,
            keep_monthly: 1,
        };
        let args = build_prune_args("/srv/borg", &keep);
        assert_eq!(&args[3..9], &[
            "--keep-daily",
            "10",
            "--keep-weekly",
            "2",
            "--keep-monthly",
            "1"
        ]);
        assert_eq!(args.last().unwrap(), "/srv/borg");
    }

    #[test]
    fn snapshot_prune_args_default() {
        insta::assert_debug_snapshot!(build_prune_args("/srv/borg", &PruneConfig::default()), @r#"
        [
            "prune",
            "--list",
            "--show-rc",
            "--keep-daily",
            "7",
            "--keep-weekly",
            "4",
            "--keep-monthly",
            "3",
            "/srv/borg",
        ]
        "#);
    }

    #[test]
    fn prune_uses_configured_retention() {
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().times(1).returning(|spec| {
            assert_eq!(spec.args[4], "10");
            assert_eq!(spec.args[6], "2");
            assert_eq!(spec.args[8], "1");
            Ok(())
        });

        let cfg = cfg(
            "[archive]\nrepo = /srv/borg\npassword = pw\n\
             [prune]\nkeep_daily = 10\nkeep_weekly = 2\nkeep_monthly = 1\n",
        );
        run(&cfg, &Runner::with_launcher(launcher, false)).unwrap();
    }

    #[test]
    fn prune_requires_archive_then_prune_section() {
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().never();
        let runner = Runner::with_launcher(launcher, false);

        let err = run(&cfg("[prune]\n"), &runner).unwrap_err();
        assert!(matches!(err, Error::MissingSection("archive")));

        let err = run(&cfg("[archive]\nrepo = r\npassword = p\n"), &runner).unwrap_err();
        assert!(matches!(err, Error::MissingSection("prune")));
    }

    #[test]
    fn prune_stops_on_bad_retention_count() {
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().never();

        let cfg = cfg("[archive]\nrepo = r\npassword = p\n[prune]\nkeep_monthly = -\n");
        let err = run(&cfg, &Runner::with_launcher(launcher, false)).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { key: "keep_monthly", .. }));
    }
}
