//! `jobs`, `fg`, `bg` (SPEC_FULL §11, grounded in `jobs.c`'s `printjobs` and
//! `resumejob`). `fg`/`bg` resume a stopped or backgrounded job by sending
//! it `SIGCONT`; `fg` additionally hands it the controlling terminal and
//! blocks the prompt on it via the Foreground Monitor, while `bg` lets it
//! keep running out of sight.

use nix::sys::signal::Signal;

use crate::errors::{Error, Result};
use crate::foreground;
use crate::job_table::JobState;
use crate::reporter;
use crate::shell::Shell;
use crate::signal;

pub const JOBS_HELP: &str = "\
jobs: jobs
    Lists the active background jobs, one per line, in the form
    `[n] <state> '<command>'`.

    Exit Status:
    Always succeeds.";

pub const FG_HELP: &str = "\
fg: fg [%jobspec]
    Resume JOBSPEC in the foreground, giving it the controlling terminal
    and waiting for it to stop or finish. Without JOBSPEC, the
    most-recently-started background job is used.

    Exit Status:
    Status of the job placed in the foreground, or failure if no such job
    exists or the shell has no job control.";

pub const BG_HELP: &str = "\
bg: bg [%jobspec]
    Resume JOBSPEC in the background, as if it had been started with `&`.
    Without JOBSPEC, the most-recently-started stopped job is used.

    Exit Status:
    Returns success unless job control is not enabled or no such job
    exists.";

pub fn jobs(shell: &mut Shell, _args: &[String]) -> Result<i32> {
    for line in reporter::list(&shell.jobs) {
        println!("{}", line);
    }
    Ok(0)
}

pub fn fg(shell: &mut Shell, args: &[String]) -> Result<i32> {
    if !shell.job_control_enabled() {
        return Err(Error::no_job_control());
    }
    let index = resolve_jobspec(shell, args.first())?;

    let pgid = shell
        .jobs
        .job(index)
        .map(|job| job.pgid())
        .ok_or_else(|| Error::no_such_job(jobspec_label(args.first(), index)))?;
    let tmodes = shell.jobs.job(index).and_then(|job| job.tmodes().cloned());
    let command = shell.jobs.command_of(index).unwrap_or_default();
    println!("[{}] continue '{}'", index, command);

    shell.jobs.move_job(index, 0);
    if let Some(job) = shell.jobs.job_mut(0) {
        for process in job.processes_mut() {
            process.set_running();
        }
    }

    shell.terminal.set_foreground(pgid)?;
    shell.terminal.restore_job_tmodes(&tmodes)?;
    signal::send_to_group(pgid, Signal::SIGCONT)?;

    let code = foreground::monitor(shell)?.unwrap_or(0);
    shell.set_last_exit_status(code);
    Ok(code)
}

pub fn bg(shell: &mut Shell, args: &[String]) -> Result<i32> {
    if !shell.job_control_enabled() {
        return Err(Error::no_job_control());
    }
    let index = resolve_jobspec(shell, args.first())?;

    let pgid = shell
        .jobs
        .job(index)
        .map(|job| job.pgid())
        .ok_or_else(|| Error::no_such_job(jobspec_label(args.first(), index)))?;
    let command = shell.jobs.command_of(index).unwrap_or_default();

    if let Some(job) = shell.jobs.job_mut(index) {
        for process in job.processes_mut() {
            process.set_running();
        }
    }
    signal::send_to_group(pgid, Signal::SIGCONT)?;
    println!("[{}] continue '{}'", index, command);

    Ok(0)
}

/// Resolves an optional `%jobspec`/bare index argument to a job table slot,
/// defaulting to the most recently started background job (spec slots are
/// >= 1; slot 0 is always the current foreground job and never a valid
/// `fg`/`bg` target).
fn resolve_jobspec(shell: &Shell, arg: Option<&String>) -> Result<usize> {
    match arg {
        Some(spec) => {
            let digits = spec.strip_prefix('%').unwrap_or(spec);
            let index = digits
                .parse::<usize>()
                .map_err(|_| Error::builtin_command(format!("{}: arguments must be job IDs", spec), 1))?;
            if index == 0 || !shell.jobs.is_occupied(index) {
                return Err(Error::no_such_job(spec.clone()));
            }
            Ok(index)
        }
        None => {
            let index = (1..shell.jobs.len())
                .filter(|&i| shell.jobs.is_occupied(i))
                .filter(|&i| shell.jobs.peek_state(i) != Some(JobState::Finished))
                .last()
                .ok_or_else(|| Error::no_such_job("current"))?;
            Ok(index)
        }
    }
}

fn jobspec_label(arg: Option<&String>, index: usize) -> String {
    match arg {
        Some(spec) => spec.clone(),
        None => format!("%{}", index),
    }
}
