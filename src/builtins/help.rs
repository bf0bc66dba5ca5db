//! `help` (SPEC_FULL §11). A directory of the other builtins' own help
//! text, rather than a builtin with independent content of its own.

use crate::builtins::{dirs, env, exit, history, jobs, kill};
use crate::errors::{Error, Result};

pub const HELP: &str = "\
help: help [pattern ...]
    Display helpful information about builtin commands. If PATTERN is
    given, gives detailed help for each builtin whose name contains
    PATTERN; with no arguments, lists every builtin's help text.";

fn topics() -> Vec<(&'static str, &'static str)> {
    vec![
        ("cd", dirs::HELP),
        ("declare", env::DECLARE_HELP),
        ("exit", exit::HELP),
        ("help", HELP),
        ("history", history::HELP),
        ("jobs", jobs::JOBS_HELP),
        ("fg", jobs::FG_HELP),
        ("bg", jobs::BG_HELP),
        ("kill", kill::HELP),
        ("unset", env::UNSET_HELP),
    ]
}

pub fn help(args: &[String]) -> Result<i32> {
    if args.is_empty() {
        for (_, text) in topics() {
            println!("{}", text);
        }
        return Ok(0);
    }

    let mut matched_any = false;
    for pattern in args {
        for (name, text) in topics() {
            if name.contains(pattern.as_str()) {
                println!("{}", text);
                matched_any = true;
            }
        }
    }

    if matched_any {
        Ok(0)
    } else {
        Err(Error::builtin_command(
            format!("help: no help topics match `{}'", args.join(" ")),
            1,
        ))
    }
}
