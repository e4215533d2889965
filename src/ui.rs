//! Terminal output — command echoes, spinners and captured execution.
//!
//! Every command sftbackup runs (or would run, with `--dryrun`) is echoed to
//! stdout shell-style as `$ <command>`, so the output doubles as a transcript
//! that can be replayed by hand.  borg itself inherits the terminal; only
//! short helper commands such as `snapper list` are captured, behind a
//! spinner.

use std::{
    process::{Command, Output, Stdio},
    time::Duration,
};

use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};

/// Braille spinner frames — same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

// ─── Echo ─────────────────────────────────────────────────────────────────────

/// Print `$ <line>`.
pub fn echo(line: &str) {
    println!("{} {}", style("$").dim(), style(line).bold());
}

/// Print a progress note that is not a command.
pub fn announce(msg: &str) {
    println!("{msg}");
}

/// Whether stdout is an interactive terminal (borg `--progress` is only
/// useful there).
pub fn stdout_is_terminal() -> bool {
    Term::stdout().is_term()
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Create and start an indeterminate spinner for `label`.
///
/// indicatif draws to stderr and stays hidden when that is not a terminal.
fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(spinner_style.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Captured execution ───────────────────────────────────────────────────────

/// Run a command, capturing both stdout and stderr.
///
/// Returns the success flag with the raw output, or an error if the process
/// could not be spawned at all.
pub fn run_captured(args: &[String]) -> Result<(bool, Output)> {
    let (prog, rest) = args.split_first().ok_or_else(|| Error::Spawn {
        program: String::new(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
    })?;

    let output = Command::new(prog)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| Error::Spawn {
            program: prog.clone(),
            source,
        })?;

    Ok((output.status.success(), output))
}

/// Run `args` behind a spinner and return its stdout.
///
/// On a non-zero exit the captured stderr is replayed before the error is
/// returned, so the operator sees what the tool complained about.
pub fn run_with_spinner(label: &str, args: &[String]) -> Result<String> {
    log::debug!("running {}", args.join(" "));
    let spinner = make_spinner(label);
    let result = run_captured(args);
    spinner.finish_and_clear();

    let (success, output) = result?;
    if !success {
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            eprintln!("    {line}");
        }
        return Err(Error::CommandFailed {
            program: args[0].clone(),
            status: output.status,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
