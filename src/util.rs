//! Small extension traits and helpers shared across the crate.

use std::io;
use std::os::unix::prelude::*;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Extensions for building an `ExitStatus` without spawning a process.
///
/// `std::process::ExitStatus` has no public constructor, so the job table
/// and builtin dispatcher need a way to fabricate one from a raw code.
pub trait BshExitStatusExt {
    /// Creates an `ExitStatus` indicating successful execution.
    fn from_success() -> Self;

    /// Creates an `ExitStatus` indicating unsuccessful execution (code 1).
    fn from_failure() -> Self;

    /// Creates an `ExitStatus` from a raw exit code.
    fn from_status(code: i32) -> Self;
}

impl BshExitStatusExt for ExitStatus {
    fn from_success() -> Self {
        ExitStatus::from_status(0)
    }

    fn from_failure() -> Self {
        ExitStatus::from_status(1)
    }

    fn from_status(code: i32) -> Self {
        ExitStatus::from_raw(code << 8)
    }
}

/// File descriptor used for all terminal-control syscalls (`tcgetattr`,
/// `tcsetpgrp`, `isatty`). Always stdin, matching the original shell.
pub fn get_terminal() -> RawFd {
    io::stdin().as_raw_fd()
}
