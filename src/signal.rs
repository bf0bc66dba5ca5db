//! Signal installation and the child-signal critical-section primitive.
//!
//! The handler installed here never touches the job table. It only records
//! that *something* changed; [`crate::reaper::reap`] does the actual work
//! from the main thread, inside a [`ChildSignalBlock`]. This is the
//! self-pipe/atomic-flag idiom: translating a C handler that mutated shared
//! state directly into one that can't race with the code reading that state.

use std::sync::atomic::{AtomicBool, Ordering};

use libc::c_int;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::signal::SigmaskHow;
use nix::unistd::Pid;

use crate::errors::Result;

/// Set by `handle_sigchld`, cleared by whoever next polls it. Not load-bearing
/// for correctness (the reaper's waits are non-blocking and safe to run even
/// when nothing changed) but lets callers skip a pointless scan.
pub static CHILD_SIGNAL_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigchld(_: c_int) {
    CHILD_SIGNAL_RECEIVED.store(true, Ordering::SeqCst);
}

extern "C" fn handle_sigint(_: c_int) {
    // No-op: its only job is to make the prompt's blocking read return
    // EINTR so the editor redraws, hence no SA_RESTART below.
}

/// Installs the shell's signal disposition: SIGCHLD drives the reaper,
/// SIGINT is a no-op (interrupts the prompt read without restarting it),
/// and the job-control signals the shell itself must ignore (SIGTSTP,
/// SIGTTIN, SIGTTOU) are ignored so the shell is never stopped or denied
/// terminal I/O by its own children's process group changes.
pub fn install_handlers() -> Result<()> {
    let mut child_mask = SigSet::empty();
    child_mask.add(Signal::SIGINT);
    let sa_chld = SigAction::new(
        SigHandler::Handler(handle_sigchld),
        SaFlags::SA_RESTART,
        child_mask,
    );
    unsafe { signal::sigaction(Signal::SIGCHLD, &sa_chld)? };

    let sa_int = SigAction::new(SigHandler::Handler(handle_sigint), SaFlags::empty(), SigSet::empty());
    unsafe { signal::sigaction(Signal::SIGINT, &sa_int)? };

    unsafe {
        signal::signal(Signal::SIGTSTP, SigHandler::SigIgn)?;
        signal::signal(Signal::SIGTTIN, SigHandler::SigIgn)?;
        signal::signal(Signal::SIGTTOU, SigHandler::SigIgn)?;
    }

    Ok(())
}

/// RAII critical section: blocks SIGCHLD for as long as it is alive,
/// restoring the exact prior mask on drop (including on an error-propagating
/// early return, since `?` runs destructors same as any other unwind path).
///
/// Every Job Table mutation happens inside one of these. This is the "scoped
/// resource" encoding of the signal masking discipline: entering blocks,
/// leaving restores, on every exit path.
#[must_use]
pub struct ChildSignalBlock {
    prev_mask: SigSet,
}

impl ChildSignalBlock {
    pub fn enter() -> Result<Self> {
        let mut child_set = SigSet::empty();
        child_set.add(Signal::SIGCHLD);
        let prev_mask = signal::sigprocmask(SigmaskHow::SIG_BLOCK, Some(&child_set), None)?;
        Ok(ChildSignalBlock { prev_mask })
    }

    /// The mask in effect before this block was entered, with SIGCHLD
    /// removed. Passed to [`suspend`] so the suspend's wait atomically
    /// unblocks exactly what this guard blocked.
    pub fn unblocked_mask(&self) -> SigSet {
        let mut mask = self.prev_mask;
        mask.remove(Signal::SIGCHLD);
        mask
    }
}

impl Drop for ChildSignalBlock {
    fn drop(&mut self) {
        let _ = signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.prev_mask), None);
    }
}

/// Atomically installs `mask` as the blocked set and waits for any signal to
/// be delivered. Using anything less atomic (e.g. unblock, then a separate
/// wait call) would lose a wake-up that arrives in between.
pub fn suspend(mask: &SigSet) {
    let _ = signal::sigsuspend(mask);
}

/// Unblocks SIGCHLD in the calling process's own mask. Signal masks survive
/// `execve`, so a forked child must call this after `fork` and before it
/// execs or runs a builtin -- otherwise it would inherit the shell's blocked
/// SIGCHLD and never be able to reap its own grandchildren (a pipeline stage
/// that is itself a shell, say).
pub fn unblock_child_signal() -> Result<()> {
    let mut child_set = SigSet::empty();
    child_set.add(Signal::SIGCHLD);
    signal::sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&child_set), None)?;
    Ok(())
}

/// Restores default dispositions for the signals the shell itself ignores or
/// handles specially, so a freshly forked child -- and whatever it execs --
/// behaves like an ordinary process rather than inheriting the shell's own
/// job-control stance.
/// Sends `sig` to every process in the group led by `pgid` (a negative pid
/// argument to `kill(2)` targets the whole group).
pub fn send_to_group(pgid: Pid, sig: Signal) -> Result<()> {
    signal::kill(Pid::from_raw(-pgid.as_raw()), sig)?;
    Ok(())
}

pub fn reset_child_dispositions() -> Result<()> {
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::SigDfl)?;
        signal::signal(Signal::SIGTSTP, SigHandler::SigDfl)?;
        signal::signal(Signal::SIGTTIN, SigHandler::SigDfl)?;
        signal::signal(Signal::SIGTTOU, SigHandler::SigDfl)?;
        signal::signal(Signal::SIGCHLD, SigHandler::SigDfl)?;
    }
    Ok(())
}
