//! `cd` (SPEC_FULL §11). Changes the shell's own working directory -- the
//! one builtin that would be pointless as a forked child, since a child's
//! `chdir` never affects its parent.

use std::env;
use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};

pub const HELP: &str = "\
cd: cd [dir]
    Change the current directory to DIR. The variable $HOME is the default
    directory. If DIR is '-', the new directory is $OLDPWD, the previous
    working directory.";

pub fn cd(args: &[String]) -> Result<i32> {
    let target = match args.first().map(String::as_str) {
        None => dirs::home_dir().ok_or_else(|| Error::builtin_command("cd: HOME not set", 1))?,
        Some("-") => {
            let oldpwd = env::var_os("OLDPWD")
                .ok_or_else(|| Error::builtin_command("cd: OLDPWD not set", 1))?;
            PathBuf::from(oldpwd)
        }
        Some(value) => Path::new(value).to_path_buf(),
    };

    let previous = env::current_dir()?;
    env::set_current_dir(&target).map_err(|_| {
        Error::builtin_command(format!("cd: {}: no such directory", target.display()), 1)
    })?;
    env::set_var("OLDPWD", previous);
    Ok(0)
}
