//! Background Reporter (spec §4.8). Prints the status-change lines for
//! background jobs (slots >= 1), in the formats the original job-control
//! shell used. A FINISHED job is printed once and then dropped from the
//! table, since [`JobTable::state_of`] deletes it on the query that observes
//! the FINISHED state.

use crate::job_table::{JobState, JobTable};
use crate::reaper;

/// Which background jobs a caller wants reported. `jobs` wants everything
/// (without deleting finished jobs out from under its own listing -- see
/// [`JobTable::peek_state`]); the periodic report printed before each new
/// prompt wants only what changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    Running,
    Stopped,
    Finished,
    All,
}

/// Reaps pending child-state changes, then prints one line per background
/// job whose state matches `filter`. The prompt loop calls this with
/// [`Filter::Finished`] right before printing the prompt -- still-running
/// and still-stopped jobs were already announced once when they entered
/// that state, so only newly-finished jobs are worth a line here; finished
/// jobs are then gone from the table.
pub fn report(table: &mut JobTable, filter: Filter) {
    reaper::reap(table);

    let indices: Vec<usize> = (1..table.len()).filter(|&i| table.is_occupied(i)).collect();
    for index in indices {
        let command = match table.command_of(index) {
            Some(command) => command,
            None => continue,
        };
        let (state, code) = match table.state_of(index) {
            Some(pair) => pair,
            None => continue,
        };

        let matches = match filter {
            Filter::All => true,
            Filter::Running => state == JobState::Running,
            Filter::Stopped => state == JobState::Stopped,
            Filter::Finished => state == JobState::Finished,
        };
        if !matches {
            continue;
        }

        match state {
            JobState::Running => println!("[{}] running '{}'", index, command),
            JobState::Stopped => println!("[{}] suspended '{}'", index, command),
            JobState::Finished => {
                print_finished(index, &command, code.unwrap_or(0));
            }
        }
    }
}

/// `exited 'cmd', status=N` for a normal exit, `killed 'cmd' by signal N` for
/// one that died from a signal -- see [`crate::reaper`]'s encoding.
fn print_finished(index: usize, command: &str, code: i32) {
    if code < 0 {
        println!("[{}] killed '{}' by signal {}", index, command, -code);
    } else {
        println!("[{}] exited '{}', status={}", index, command, code);
    }
}

/// Renders the `jobs` builtin's listing: every occupied background slot,
/// without the side effect of freeing finished ones (that's `peek_state`,
/// not `state_of`).
pub fn list(table: &JobTable) -> Vec<String> {
    let mut lines = Vec::new();
    for index in 1..table.len() {
        if !table.is_occupied(index) {
            continue;
        }
        let command = table.command_of(index).unwrap_or_default();
        let state = match table.peek_state(index) {
            Some(state) => state,
            None => continue,
        };
        let label = match state {
            JobState::Running => "running",
            JobState::Stopped => "suspended",
            JobState::Finished => "finished",
        };
        lines.push(format!("[{}] {} '{}'", index, label, command));
    }
    lines
}
