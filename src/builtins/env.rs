//! `declare` and `unset` (SPEC_FULL §11). These mutate the shell process's
//! own environment, which a forked external command would inherit a copy of
//! but never propagate back -- so, like `cd`, they only make sense run
//! directly in the shell (or in a forked pipeline stage, where their effect
//! is scoped to that stage's own children).

use std::env;

use crate::errors::{Error, Result};

pub const DECLARE_HELP: &str = "\
declare: declare [name[=value] ...]
    Declare a variable and assign it a value.";

pub const UNSET_HELP: &str = "\
unset: unset [name ...]
    For each name, remove the corresponding variable.";

pub fn declare(args: &[String]) -> Result<i32> {
    let mut bad_args = Vec::new();
    for arg in args {
        let mut parts = arg.splitn(2, '=');
        match parts.next() {
            Some("") | None => bad_args.push(arg.clone()),
            Some(name) => env::set_var(name, parts.next().unwrap_or("")),
        }
    }

    if bad_args.is_empty() {
        Ok(0)
    } else {
        let message = bad_args
            .iter()
            .map(|arg| format!("declare: {}: not a valid identifier", arg))
            .collect::<Vec<String>>()
            .join("\n");
        Err(Error::builtin_command(message, 1))
    }
}

pub fn unset(args: &[String]) -> Result<i32> {
    let mut bad_args = Vec::new();
    for arg in args {
        if arg.is_empty() || arg.contains('=') {
            bad_args.push(arg.clone());
        } else {
            env::remove_var(arg);
        }
    }

    if bad_args.is_empty() {
        Ok(0)
    } else {
        let message = bad_args
            .iter()
            .map(|arg| format!("unset: {}: not a valid identifier", arg))
            .collect::<Vec<String>>()
            .join("\n");
        Err(Error::builtin_command(message, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn unique_key() -> String {
        format!("JCSH_TEST_VAR_{}_{}", std::process::id(), COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    #[test]
    fn declare_invalid_identifier() {
        assert!(declare(&["".into()]).is_err());
        assert!(declare(&["=FOO".into()]).is_err());

        let key = unique_key();
        let value = "bar";
        assert!(declare(&["=baz".into(), format!("{}={}", key, value), "=baz".into()]).is_err());
        assert_eq!(env::var(&key).unwrap(), value);
    }

    #[test]
    fn declare_assignment_without_value_defaults_to_empty() {
        let key = unique_key();
        assert!(declare(&[key.clone()]).is_ok());
        assert_eq!(env::var(&key).unwrap(), "");
    }

    #[test]
    fn declare_overwrites_existing_value() {
        let key = unique_key();
        assert!(declare(&[format!("{}=bar", key)]).is_ok());
        assert_eq!(env::var(&key).unwrap(), "bar");
        assert!(declare(&[format!("{}=baz", key)]).is_ok());
        assert_eq!(env::var(&key).unwrap(), "baz");
    }

    #[test]
    fn unset_invalid_identifier() {
        let key = unique_key();
        assert!(declare(&[key.clone()]).is_ok());
        assert!(unset(&["".into(), key.clone(), "=FOO".into()]).is_err());
        assert!(env::var(&key).is_err());
    }

    #[test]
    fn unset_multiple_names() {
        let key1 = unique_key();
        let key2 = unique_key();
        assert!(declare(&[key1.clone(), key2.clone()]).is_ok());
        assert!(unset(&[key1.clone(), key2.clone()]).is_ok());
        assert!(env::var(&key1).is_err());
        assert!(env::var(&key2).is_err());
    }
}
