//! `kill` (SPEC_FULL §11, grounded in `jobs.c`'s `killjob`: SIGTERM then
//! SIGCONT to the process group, so a stopped job can receive and act on
//! the SIGTERM). Exposed as a builtin mainly so job ids (`%1`) can be used
//! instead of raw pids.

use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::errors::{Error, Result};
use crate::shell::Shell;
use crate::signal;

pub const HELP: &str = "\
kill: kill pid | %jobspec
    Send SIGTERM to the process or job group identified by PID or
    %JOBSPEC. For a job, SIGCONT follows so a stopped job can act on the
    SIGTERM rather than dying only once resumed.

    Exit Status:
    Returns success unless an invalid argument is given or no such job or
    process exists.";

pub fn kill(shell: &mut Shell, args: &[String]) -> Result<i32> {
    let target = args.first().ok_or_else(|| Error::builtin_command(HELP, 2))?;

    if let Some(jobspec) = target.strip_prefix('%') {
        let index = jobspec.parse::<usize>().map_err(|_| {
            Error::builtin_command(format!("kill: {}: arguments must be job IDs", target), 1)
        })?;
        let pgid = shell
            .jobs
            .job(index)
            .map(|job| job.pgid())
            .ok_or_else(|| Error::no_such_job(target.clone()))?;
        signal::send_to_group(pgid, Signal::SIGTERM)?;
        let _ = signal::send_to_group(pgid, Signal::SIGCONT);
    } else {
        let pid = target.parse::<i32>().map_err(|_| {
            Error::builtin_command(
                format!("kill: {}: arguments must be process or job IDs", target),
                1,
            )
        })?;
        nix::sys::signal::kill(Pid::from_raw(pid), Signal::SIGTERM)?;
    }

    Ok(0)
}
