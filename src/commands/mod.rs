//! Operation handlers.
//!
//! Each file in this module corresponds to one subcommand:
//!
//! | File          | Invocation           | borg command                       |
//! |---------------|----------------------|------------------------------------|
//! | `init.rs`     | `sftbackup init`     | `borg init --encryption repokey`   |
//! | `prune.rs`    | `sftbackup prune`    | `borg prune --keep-…`              |
//! | `backup.rs`   | `sftbackup backup`   | `borg create`, then maybe `prune`  |
//!
//! Every handler takes the borg [`Runner`](crate::runner::Runner) as a
//! parameter so tests can swap in a mock launcher.

pub mod backup;
pub mod init;
pub mod prune;
