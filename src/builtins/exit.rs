//! `exit` (SPEC_FULL §11). Refuses to exit while jobs remain, the first
//! time it's asked -- mirroring `bash`'s "There are stopped jobs." warning
//! -- but honors a second, immediate `exit` (or `exit -f`) so the user
//! isn't stuck.

use crate::errors::{Error, Result};
use crate::shell::Shell;

pub const HELP: &str = "\
exit: exit [-f] [n]
    Exit the shell with a status of N. If N is omitted, the exit status
    is that of the last command executed. If jobs are still running or
    stopped, the first `exit` warns instead of exiting; `exit -f` or a
    second `exit` forces it.";

pub fn exit(shell: &mut Shell, args: &[String]) -> Result<i32> {
    let mut force = false;
    let mut code_arg = None;
    for arg in args {
        if arg == "-f" {
            force = true;
        } else {
            code_arg = Some(arg);
        }
    }

    if !force && shell.has_jobs() && !shell.exit_warning_issued() {
        shell.set_exit_warning_issued(true);
        return Err(Error::builtin_command("There are stopped jobs.", 1));
    }

    let code = match code_arg {
        Some(arg) => arg.parse::<i32>().map_err(|_| {
            Error::builtin_command(format!("exit: {}: numeric argument required", arg), 2)
        })?,
        None => shell.last_exit_status(),
    };

    shell.request_exit(code);
    Ok(code)
}
