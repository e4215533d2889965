//! Repository password handling.
//!
//! The `[archive] password` value is either the passphrase itself or, when
//! it starts with `~`, `/` or `.`, the path of a file holding it.  borg gets
//! the resolved passphrase through a [`PasswordFile`]: a private temp file
//! that `BORG_PASSCOMMAND` reads with `cat`.  The passphrase therefore never
//! shows up in argv or in the environment of the child.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Environment variable borg runs to obtain the passphrase.
pub const PASSCOMMAND_ENV: &str = "BORG_PASSCOMMAND";

/// Does this password value name a file rather than being the secret itself?
pub fn looks_like_path(spec: &str) -> bool {
    spec.starts_with(['~', '/', '.'])
}

/// Resolve a password value to the actual passphrase.
///
/// File contents are trimmed.  A path that does not exist falls back to the
/// literal value with a warning, since that is most likely a typo in the
/// config rather than a passphrase that happens to start with `/`.
pub fn resolve(spec: &str) -> Result<String> {
    if !looks_like_path(spec) {
        return Ok(spec.to_owned());
    }

    let path = expand_tilde(spec);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(text.trim().to_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!(
                "tried to use password as file, but could not find {}",
                path.display()
            );
            Ok(spec.to_owned())
        },
        Err(source) => Err(Error::PasswordRead { path, source }),
    }
}

/// Expand a leading `~` or `~/` to the current user's home directory.
///
/// `~user` forms are left alone.
pub fn expand_tilde(spec: &str) -> PathBuf {
    let rest = match spec.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(spec),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(spec),
    }
}

// ─── Password file ────────────────────────────────────────────────────────────

/// The passphrase written to a private temp file.
///
/// The file is created with mode 0600 and removed when this value is
/// dropped, on success and error paths alike.
#[derive(Debug)]
pub struct PasswordFile {
    file: NamedTempFile,
}

impl PasswordFile {
    pub fn create(secret: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("sftbackup-")
            .tempfile()
            .map_err(Error::PasswordWrite)?;
        file.write_all(secret.as_bytes())
            .and_then(|()| file.flush())
            .map_err(Error::PasswordWrite)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Value for [`PASSCOMMAND_ENV`].
    ///
    /// borg splits the command shell-style, so the path is single-quoted.
    pub fn passcommand(&self) -> String {
        format!("cat {}", shell_quote(&self.path().to_string_lossy()))
    }
}

/// Single-quote `s` for a POSIX shell word splitter.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_password_is_returned_unchanged() {
        assert_eq!(resolve("plainpass").unwrap(), "plainpass");
    }

    #[test]
    fn password_file_contents_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        fs::write(&path, "hunter2\n").unwrap();

        assert_eq!(resolve(path.to_str().unwrap()).unwrap(), "hunter2");
    }

    #[test]
    fn missing_password_file_falls_back_to_literal() {
        let spec = "/tmp/this-password-file-should-never-exist-sftbackup";
        assert!(!Path::new(spec).exists(), "test precondition");
        assert_eq!(resolve(spec).unwrap(), spec);
    }

    #[test]
    fn unreadable_password_path_is_an_error() {
        // A directory exists but cannot be read as a file.
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::PasswordRead { .. }));
    }

    #[test]
    fn path_detection_uses_first_char() {
        assert!(looks_like_path("/etc/key"));
        assert!(looks_like_path("./key"));
        assert!(looks_like_path("~/key"));
        assert!(!looks_like_path("key/with/slashes"));
        assert!(!looks_like_path(""));
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("~/.borg/key"), home.join(".borg/key"));
        assert_eq!(expand_tilde("~alice/key"), PathBuf::from("~alice/key"));
        assert_eq!(expand_tilde("/abs/key"), PathBuf::from("/abs/key"));
    }

    // ── PasswordFile ──────────────────────────────────────────────────────────

    #[test]
    fn password_file_holds_secret_and_is_removed_on_drop() {
        let file = PasswordFile::create("s3cr3t").unwrap();
        let path = file.path().to_owned();
        assert_eq!(fs::read_to_string(&path).unwrap(), "s3cr3t");

        drop(file);
        assert!(!path.exists(), "password file must be removed on drop");
    }

    #[test]
    fn passcommand_quotes_the_path() {
        let file = PasswordFile::create("x").unwrap();
        let cmd = file.passcommand();
        assert_eq!(cmd, format!("cat '{}'", file.path().display()));
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("/tmp/it's"), r"'/tmp/it'\''s'");
    }
}
