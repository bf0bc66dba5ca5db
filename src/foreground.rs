//! Foreground Monitor (spec §4.7). Blocks the prompt until the current
//! foreground job (slot 0) either terminates or is stopped, then returns
//! control -- and terminal ownership -- to the shell.

use crate::errors::Result;
use crate::job_table::JobState;
use crate::reaper;
use crate::shell::Shell;
use crate::signal::{self, ChildSignalBlock};

enum Outcome {
    KeepWaiting,
    Stopped(usize, String),
    Finished(Option<i32>),
}

/// Waits for slot 0's job to stop or finish. Returns the job's exit code
/// (only meaningful if the job actually finished; `None` otherwise).
///
/// The [`ChildSignalBlock`] guard spans the whole reap-decide-suspend
/// sequence, including the `suspend` call itself (spec §4.7: "the
/// suspension primitive must atomically install the pre-block mask and
/// wait; otherwise wake-ups can be lost between the state check and the
/// wait"). Dropping the guard before calling `suspend` -- e.g. by scoping
/// it to just the reap/decide step -- would unblock SIGCHLD and leave a
/// window where a state change arriving before `sigsuspend` is entered is
/// consumed by the handler and never seen again, hanging the prompt
/// forever. `Shell::shutdown` holds its guard the same way.
pub fn monitor(shell: &mut Shell) -> Result<Option<i32>> {
    loop {
        let block = ChildSignalBlock::enter()?;
        reaper::reap(&mut shell.jobs);
        let outcome = match shell.jobs.state_of(0) {
            None => Outcome::Finished(None),
            Some((JobState::Running, _)) => Outcome::KeepWaiting,
            Some((JobState::Stopped, _)) => {
                let new_index = shell.jobs.alloc_background();
                shell.jobs.move_job(0, new_index);
                let command = shell.jobs.command_of(new_index).unwrap_or_default();
                Outcome::Stopped(new_index, command)
            }
            Some((JobState::Finished, code)) => Outcome::Finished(code),
        };

        match outcome {
            Outcome::KeepWaiting => {
                signal::suspend(&block.unblocked_mask());
                drop(block);
                continue;
            }
            Outcome::Stopped(new_index, command) => {
                drop(block);
                println!("[{}] suspended '{}'", new_index, command);
                shell.terminal.reclaim()?;
                return Ok(None);
            }
            Outcome::Finished(code) => {
                drop(block);
                shell.terminal.reclaim()?;
                return Ok(code);
            }
        }
    }
}
