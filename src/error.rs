//! Error type shared by every module.
//!
//! Library-style code returns [`Result`]; `main` converts into
//! [`anyhow::Error`] and attaches context there.

use std::{io, path::PathBuf, process::ExitStatus};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not read config file \"{}\"", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config file \"{}\"", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },
    #[error("config file needs a [{0}] section")]
    MissingSection(&'static str),
    #[error("config section [{section}] is missing the required key \"{key}\"")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },
    #[error("[{section}] {key} = \"{value}\" is not a valid number")]
    InvalidNumber {
        section: &'static str,
        key: &'static str,
        value: String,
    },
    #[error("could not read password file \"{}\"", path.display())]
    PasswordRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write password file")]
    PasswordWrite(#[source] io::Error),
    #[error("no snapper snapshot owned by root found")]
    NoSnapshot,
    #[error("snapshot {id} has an unparsable date \"{date}\"")]
    SnapshotDate {
        id: u64,
        date: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited unsuccessfully ({status})")]
    CommandFailed { program: String, status: ExitStatus },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
