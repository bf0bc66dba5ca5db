//! Builtin commands (SPEC_FULL §11 supplemented set). Each builtin takes its
//! already-redirection-stripped arguments (not including its own name) and
//! returns its exit status, or a [`crate::errors::Error`] whose
//! `BuiltinCommand` variant carries the message to print and the status to
//! report.

mod dirs;
mod env;
mod exit;
mod help;
mod history;
mod jobs;
mod kill;

use crate::errors::Result;
use crate::shell::Shell;

const CD: &str = "cd";
const DECLARE: &str = "declare";
const EXIT: &str = "exit";
const HELP: &str = "help";
const HISTORY: &str = "history";
const JOBS: &str = "jobs";
const FG: &str = "fg";
const BG: &str = "bg";
const KILL: &str = "kill";
const UNSET: &str = "unset";

/// Whether `program` names one of the shell's builtin commands.
pub fn is_builtin(program: &str) -> bool {
    matches!(
        program,
        CD | DECLARE | EXIT | HELP | HISTORY | JOBS | FG | BG | KILL | UNSET
    )
}

/// Runs the builtin named by `argv[0]`. Returns `None` if it isn't one.
pub fn dispatch(shell: &mut Shell, argv: &[String]) -> Option<Result<i32>> {
    let name = argv.first()?.as_str();
    let args = &argv[1..];
    let result = match name {
        CD => dirs::cd(args),
        DECLARE => env::declare(args),
        UNSET => env::unset(args),
        EXIT => exit::exit(shell, args),
        HELP => help::help(args),
        HISTORY => history::history(shell, args),
        JOBS => jobs::jobs(shell, args),
        FG => jobs::fg(shell, args),
        BG => jobs::bg(shell, args),
        KILL => kill::kill(shell, args),
        _ => return None,
    };
    Some(result)
}
