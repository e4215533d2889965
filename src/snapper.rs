//! snapper snapshot discovery.
//!
//! `snapper list` prints a pipe-separated table:
//!
//! ```text
//!  #  | Type   | Pre # | Date                    | User | Cleanup  | Description | Userdata
//! ----+--------+-------+-------------------------+------+----------+-------------+---------
//!  0  | single |       |                         | root |          | current     |
//!  41 | single |       | 2024-03-01T03:00:01 UTC | root | timeline | timeline    |
//! ```
//!
//! Only rows owned by `root` with a numeric id are kept.  The table format is
//! tied to the snapper version, so the parsing sits behind
//! [`SnapshotLister`] and can be swapped or faked.

use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Timelike};
#[cfg(test)]
use mockall::automock;

use crate::{
    error::{Error, Result},
    ui,
};

/// Format of the snapper date column.
///
/// `%Z` skips the zone name, and chrono also accepts the date when the zone
/// is missing altogether.  Only the wall-clock part ends up in archive names.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S %Z";

/// ISO 8601 as used in archive names: microseconds only when non-zero.
pub fn isoformat(t: &NaiveDateTime) -> String {
    if t.nanosecond() / 1_000 == 0 {
        t.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        t.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// One row of `snapper list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: u64,
    pub kind: String,
    pub pre_id: String,
    pub date: String,
    pub user: String,
    pub cleanup: String,
    pub description: String,
    pub userdata: String,
}

impl Snapshot {
    /// Parse the date column.
    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, DATE_FORMAT).map_err(|source| {
            Error::SnapshotDate {
                id: self.id,
                date: self.date.clone(),
                source,
            }
        })
    }

    /// borg archive name for this snapshot: `snapshot-<id>-<iso date>`.
    pub fn archive_name(&self) -> Result<String> {
        let date = self.timestamp()?;
        Ok(format!("snapshot-{}-{}", self.id, isoformat(&date)))
    }

    /// Directory holding the snapshot's files: `<rootdir>/<snapdir>/<id>/snapshot`.
    pub fn directory(&self, rootdir: &Path, snapdir: &Path) -> PathBuf {
        rootdir
            .join(snapdir)
            .join(self.id.to_string())
            .join("snapshot")
    }
}

// ─── Parsing ──────────────────────────────────────────────────────────────────

/// Parse `snapper list` output into root-owned snapshots sorted by id.
///
/// Header, separator and short lines are skipped without complaint.
pub fn parse_list(output: &str) -> Vec<Snapshot> {
    let mut snapshots: Vec<Snapshot> = output.lines().filter_map(parse_line).collect();
    snapshots.sort_by_key(|s| s.id);
    snapshots
}

fn parse_line(line: &str) -> Option<Snapshot> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < 5 || fields[4] != "root" {
        return None;
    }

    // Newer snapper versions mark the active/default snapshot with `*`, `-` or `+`.
    let id = fields[0].trim_end_matches(['*', '-', '+']).parse().ok()?;
    let field = |i: usize| fields.get(i).copied().unwrap_or_default().to_owned();

    Some(Snapshot {
        id,
        kind: field(1),
        pre_id: field(2),
        date: field(3),
        user: field(4),
        cleanup: field(5),
        description: field(6),
        userdata: field(7),
    })
}

/// The snapshot with the highest id.
pub fn latest(snapshots: &[Snapshot]) -> Result<&Snapshot> {
    snapshots.iter().max_by_key(|s| s.id).ok_or(Error::NoSnapshot)
}

// ─── Lister ───────────────────────────────────────────────────────────────────

/// Source of snapshot records.
#[cfg_attr(test, automock)]
pub trait SnapshotLister {
    /// Root-owned snapshots, ascending by id.
    fn list(&self) -> Result<Vec<Snapshot>>;
}

/// Runs the real `snapper list`.
#[derive(Debug, Default)]
pub struct Snapper;

impl SnapshotLister for Snapper {
    fn list(&self) -> Result<Vec<Snapshot>> {
        let args = ["snapper".to_string(), "list".to_string()];
        let output = ui::run_with_spinner("Listing snapper snapshots", &args)?;
        Ok(parse_list(&output))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
 #  | Type   | Pre # | Date                    | User  | Cleanup  | Description | Userdata
----+--------+-------+-------------------------+-------+----------+-------------+---------
 0  | single |       |                         | root  |          | current     |
 3  | single |       | 2024-03-01T03:00:01 UTC | root  | timeline | timeline    |
 1  | pre    |       | 2024-02-28T10:15:00 UTC | root  | number   | zypp(zypper)| important=yes
 7  | single |       | 2024-03-02T03:00:02 UTC | root  | timeline | timeline    |
 9  | single |       | 2024-03-02T04:00:00 UTC | alice | timeline | home        |
garbage line
";

    fn snap(id: u64, user: &str, date: &str) -> Snapshot {
        Snapshot {
            id,
            kind: "single".into(),
            pre_id: String::new(),
            date: date.into(),
            user: user.into(),
            cleanup: String::new(),
            description: String::new(),
            userdata: String::new(),
        }
    }

    #[test]
    fn parse_keeps_only_root_rows_sorted_by_id() {
        let ids: Vec<u64> = parse_list(LISTING).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 3, 7]);
    }

    #[test]
    fn parse_fills_all_columns() {
        let snapshots = parse_list(LISTING);
        let pre = snapshots.iter().find(|s| s.id == 1).unwrap();
        assert_eq!(pre.kind, "pre");
        assert_eq!(pre.date, "2024-02-28T10:15:00 UTC");
        assert_eq!(pre.cleanup, "number");
        assert_eq!(pre.description, "zypp(zypper)");
        assert_eq!(pre.userdata, "important=yes");
    }

    #[test]
    fn parse_skips_short_lines() {
        assert!(parse_list("1 | single | | root").is_empty());
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn parse_tolerates_missing_trailing_columns() {
        let snapshots = parse_list("5 | single | | 2024-01-01T00:00:00 UTC | root");
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].cleanup, "");
        assert_eq!(snapshots[0].userdata, "");
    }

    #[test]
    fn parse_strips_active_marker_from_id() {
        let snapshots = parse_list("12* | single | | 2024-01-01T00:00:00 UTC | root | | |");
        assert_eq!(snapshots[0].id, 12);
    }

    #[test]
    fn latest_picks_highest_id() {
        let snapshots = vec![
            snap(3, "root", ""),
            snap(1, "root", ""),
            snap(7, "root", ""),
        ];
        assert_eq!(latest(&snapshots).unwrap().id, 7);
    }

    #[test]
    fn latest_of_nothing_is_an_error() {
        assert!(matches!(latest(&[]), Err(Error::NoSnapshot)));
        let only_users = parse_list(" 9 | single | | 2024-03-02T04:00:00 UTC | alice | | |");
        assert!(matches!(latest(&only_users), Err(Error::NoSnapshot)));
    }

    #[test]
    fn archive_name_uses_iso_date() {
        let s = snap(41, "root", "2024-03-01T03:00:01 UTC");
        assert_eq!(s.archive_name().unwrap(), "snapshot-41-2024-03-01T03:00:01");
    }

    #[test]
    fn archive_name_ignores_zone_name() {
        let s = snap(2, "root", "2023-12-24T18:30:00 CET");
        assert_eq!(s.archive_name().unwrap(), "snapshot-2-2023-12-24T18:30:00");
    }

    #[test]
    fn date_without_zone_is_accepted() {
        let s = snap(1, "root", "2024-03-01T03:00:01");
        assert_eq!(s.archive_name().unwrap(), "snapshot-1-2024-03-01T03:00:01");
    }

    #[test]
    fn isoformat_shows_microseconds_only_when_present() {
        let t = NaiveDateTime::parse_from_str("2024-05-06 07:08:09", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(isoformat(&t), "2024-05-06T07:08:09");
        let t = t.with_nanosecond(123_456_000).unwrap();
        assert_eq!(isoformat(&t), "2024-05-06T07:08:09.123456");
    }

    #[test]
    fn unparsable_date_is_an_error() {
        // The "current" pseudo-snapshot has no date.
        let err = snap(0, "root", "").archive_name().unwrap_err();
        assert!(matches!(err, Error::SnapshotDate { id: 0, .. }));
    }

    #[test]
    fn directory_is_below_snapdir() {
        let s = snap(7, "root", "");
        assert_eq!(
            s.directory(Path::new("/"), Path::new(".snapshots")),
            PathBuf::from("/.snapshots/7/snapshot")
        );
        assert_eq!(
            s.directory(Path::new("/mnt/root"), Path::new("snaps")),
            PathBuf::from("/mnt/root/snaps/7/snapshot")
        );
    }
}
