//! Child-State Reaper (spec §4.3). Invoked from the main thread after the
//! asynchronous child-signal handler records that something changed; walks
//! every slot and polls non-blockingly for state changes, since one signal
//! delivery may correspond to several children changing state at once.

use log::trace;
use nix::sys::signal::Signal;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use crate::job_table::JobTable;

/// Polls every tracked process for an available state change and updates
/// the job table accordingly. Safe to call even when nothing changed: the
/// underlying `waitpid` calls are all non-blocking (`WNOHANG`).
pub fn reap(table: &mut JobTable) {
    for (index, job) in table.iter_mut() {
        for process in job.processes_mut() {
            let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
            match wait::waitpid(process.pid(), Some(flags)) {
                Ok(WaitStatus::Exited(pid, code)) => {
                    trace!("job {}: pid {} exited with status {}", index, pid, code);
                    process.set_finished(encode_exited(code));
                }
                Ok(WaitStatus::Signaled(pid, signal, _core_dumped)) => {
                    trace!("job {}: pid {} killed by signal {:?}", index, pid, signal);
                    process.set_finished(encode_signaled(signal));
                }
                Ok(WaitStatus::Stopped(pid, signal)) => {
                    trace!("job {}: pid {} stopped by signal {:?}", index, pid, signal);
                    process.set_stopped();
                }
                Ok(WaitStatus::Continued(pid)) => {
                    trace!("job {}: pid {} continued", index, pid);
                    process.set_running();
                }
                Ok(WaitStatus::StillAlive) => {}
                Ok(_) => {}
                Err(nix::Error::Sys(nix::errno::Errno::ECHILD)) => {
                    // The process already has no live child to wait for
                    // (e.g. reaped by an earlier call this same pass).
                }
                Err(_) => {}
            }
        }
    }
}

/// The exitcode stored on a finished [`ProcessRecord`](crate::job_table::ProcessRecord)
/// encodes which of the two ways a process can finish happened, so the
/// Background Reporter can tell `exited ... status=N` from `killed ... by
/// signal N` apart: a non-negative value is a plain exit status, a negative
/// value is `-signal_number`.
fn encode_exited(code: i32) -> i32 {
    code
}

fn encode_signaled(signal: Signal) -> i32 {
    -(signal as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_table::{JobState, JobTable};
    use nix::sys::signal::{self, Signal};
    use nix::unistd::{fork, ForkResult};
    use std::thread;
    use std::time::Duration;

    /// Polls `reap` until the job at `index` reports FINISHED or a budget
    /// of retries is exhausted, since `waitpid(WNOHANG)` may need a few
    /// scheduler ticks to observe a just-forked child's exit.
    fn wait_until_finished(table: &mut JobTable, index: usize) {
        for _ in 0..200 {
            reap(table);
            if table.job(index).map(|j| j.state()) == Some(JobState::Finished) {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("process never reported finished within the test budget");
    }

    #[test]
    fn reap_records_normal_exit_status() {
        let mut table = JobTable::new();
        let child = match unsafe { fork() }.unwrap() {
            ForkResult::Child => std::process::exit(7),
            ForkResult::Parent { child } => child,
        };
        let index = table.add_job(child, true, None);
        table.add_process(index, child, &["true".to_string()]);

        wait_until_finished(&mut table, index);
        let job = table.job(index).unwrap();
        assert_eq!(job.state(), JobState::Finished);
        assert_eq!(job.processes()[0].exitcode(), Some(7));
    }

    #[test]
    fn reap_encodes_signal_kill_as_negative_code() {
        let mut table = JobTable::new();
        let child = match unsafe { fork() }.unwrap() {
            ForkResult::Child => loop {
                thread::sleep(Duration::from_secs(5));
            },
            ForkResult::Parent { child } => child,
        };
        let index = table.add_job(child, true, None);
        table.add_process(index, child, &["sleep".to_string()]);

        signal::kill(child, Signal::SIGKILL).unwrap();

        wait_until_finished(&mut table, index);
        let job = table.job(index).unwrap();
        assert_eq!(job.processes()[0].exitcode(), Some(-(Signal::SIGKILL as i32)));
    }

    #[test]
    fn reap_marks_stopped_process_stopped() {
        let mut table = JobTable::new();
        let child = match unsafe { fork() }.unwrap() {
            ForkResult::Child => loop {
                thread::sleep(Duration::from_secs(5));
            },
            ForkResult::Parent { child } => child,
        };
        let index = table.add_job(child, true, None);
        table.add_process(index, child, &["sleep".to_string()]);

        signal::kill(child, Signal::SIGSTOP).unwrap();
        for _ in 0..200 {
            reap(&mut table);
            if table.job(index).unwrap().state() == JobState::Stopped {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(table.job(index).unwrap().state(), JobState::Stopped);

        signal::kill(child, Signal::SIGKILL).unwrap();
        wait_until_finished(&mut table, index);
    }
}
