//! `history` (SPEC_FULL §11), backed by the [`crate::editor::Editor`]'s own
//! capacity-bounded window.

use crate::errors::{Error, Result};
use crate::shell::Shell;

pub const HELP: &str = "\
history: history [-c] [-s size] [n]
    Display the history list with line numbers. An argument of N lists
    only the last N entries. `-c` clears the history list; `-s size`
    sets the maximum number of remembered entries.

    Exit Status:
    Returns success unless an invalid option or argument is given.";

pub fn history(shell: &mut Shell, args: &[String]) -> Result<i32> {
    if args.is_empty() {
        print!("{}", shell.editor);
        return Ok(0);
    }

    match args[0].as_str() {
        "-c" => {
            shell.editor.clear_history();
            Ok(0)
        }
        "-s" => {
            let size = args.get(1).ok_or_else(|| {
                Error::builtin_command("history: -s: option requires an argument", 2)
            })?;
            let n = size.parse::<usize>().map_err(|_| {
                Error::builtin_command(format!("history: {}: nonnegative numeric argument required", size), 1)
            })?;
            shell.editor.set_history_max_size(n);
            Ok(0)
        }
        n => {
            let count = n.parse::<usize>().map_err(|_| {
                Error::builtin_command(format!("history: {}: nonnegative numeric argument required", n), 1)
            })?;
            println!("{}", last_n(shell, count));
            Ok(0)
        }
    }
}

fn last_n(shell: &Shell, n: usize) -> String {
    let skip = shell.editor.get_history_count().saturating_sub(n);
    shell
        .editor
        .enumerate_history_entries()
        .skip(skip)
        .map(|(i, entry)| format!("\t{}\t{}", i + 1, entry))
        .collect::<Vec<String>>()
        .join("\n")
}
