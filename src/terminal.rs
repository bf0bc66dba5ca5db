//! Terminal Controller (spec §4.1): owns the shell's duplicate descriptor
//! for the controlling terminal and the shell's saved terminal modes, and
//! hands the terminal back and forth between the shell and whichever job
//! currently owns the foreground.

use std::os::unix::io::RawFd;

use log::debug;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::sys::termios::{self, SetArg, Termios};
use nix::unistd::{self, Pid};

use crate::errors::Result;
use crate::util;

/// The shell's handle on the controlling terminal. A shell built with
/// [`crate::shell::ShellConfig::noninteractive`] has no terminal to own --
/// `detached()` builds a handle whose operations are all no-ops, so the
/// rest of the core (Executor, Foreground Monitor) never has to branch on
/// whether job control is enabled.
pub struct Terminal {
    /// A `dup`'d copy of the controlling terminal, marked close-on-exec so
    /// it never leaks into an external program's file descriptor table.
    /// `-1` for a detached (non-interactive) terminal.
    fd: RawFd,
    /// Captured once at startup; restored every time a foreground job
    /// releases the terminal back to the shell. `None` for a detached
    /// terminal, which owns no terminal modes to restore.
    shell_tmodes: Option<Termios>,
}

impl Terminal {
    /// Duplicates the controlling terminal, claims it for the shell's own
    /// process group, and captures the shell's own terminal modes. Called
    /// once during shell initialization (spec §4.9/component 7 Lifecycle).
    pub fn init() -> Result<Self> {
        let stdin_fd = util::get_terminal();
        let fd = unistd::dup(stdin_fd)?;
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
        unistd::tcsetpgrp(fd, unistd::getpgrp())?;
        let shell_tmodes = termios::tcgetattr(fd)?;
        Ok(Terminal {
            fd,
            shell_tmodes: Some(shell_tmodes),
        })
    }

    /// A handle for a shell with no controlling terminal to own. Used by
    /// [`ShellConfig::noninteractive`](crate::shell::ShellConfig::noninteractive)
    /// shells, which exist so tests can drive the Job Table / Executor /
    /// Reaper without a real tty.
    pub fn detached() -> Self {
        Terminal {
            fd: -1,
            shell_tmodes: None,
        }
    }

    /// The duplicated terminal descriptor, used for every `tcsetpgrp` /
    /// `tcgetattr` / `tcsetattr` call.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// The terminal modes the shell itself started with, if any.
    pub fn shell_tmodes(&self) -> Option<&Termios> {
        self.shell_tmodes.as_ref()
    }

    /// Makes `pgid` the terminal's foreground process group.
    pub fn set_foreground(&self, pgid: Pid) -> Result<()> {
        if self.fd < 0 {
            return Ok(());
        }
        debug!("setting terminal foreground process group to {}", pgid);
        unistd::tcsetpgrp(self.fd, pgid)?;
        Ok(())
    }

    /// Makes the shell's own process group the foreground group again and
    /// restores the shell's saved terminal modes, with "drain" semantics
    /// (queued output is flushed before the new modes take effect).
    pub fn reclaim(&self) -> Result<()> {
        if self.fd < 0 {
            return Ok(());
        }
        debug!("reclaiming terminal for the shell");
        let shell_pgid = unistd::getpgrp();
        self.set_foreground(shell_pgid)?;
        if let Some(tmodes) = &self.shell_tmodes {
            termios::tcsetattr(self.fd, SetArg::TCSADRAIN, tmodes)?;
        }
        Ok(())
    }

    /// Captures the terminal's current modes, to be restored the next time
    /// this job is resumed in the foreground.
    pub fn save_job_tmodes(&self) -> Option<Termios> {
        if self.fd < 0 {
            return None;
        }
        termios::tcgetattr(self.fd).ok().or_else(|| self.shell_tmodes.clone())
    }

    /// Installs a job's previously-saved terminal modes, e.g. when resuming
    /// a stopped job that had customized the terminal (raw mode, etc.).
    pub fn restore_job_tmodes(&self, tmodes: &Option<Termios>) -> Result<()> {
        if self.fd < 0 {
            return Ok(());
        }
        if let Some(tmodes) = tmodes {
            termios::tcsetattr(self.fd, SetArg::TCSADRAIN, tmodes)?;
        }
        Ok(())
    }

    /// Closes the duplicated terminal descriptor. Called once during
    /// shutdown (spec §4.9).
    pub fn close(&self) {
        if self.fd >= 0 {
            let _ = unistd::close(self.fd);
        }
    }
}
