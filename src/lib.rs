//! jcsh - an interactive job-control shell core.
//!
//! See the [module overview](crate) components: [`tokenizer`] splits a
//! command line into words and redirection markers, [`redirection`] opens
//! the files they name, [`executor`] forks and wires up pipeline stages,
//! [`job_table`] and [`reaper`] track their state, [`terminal`] hands the
//! controlling terminal back and forth, and [`foreground`] blocks the
//! prompt on the current foreground job.

#![deny(trivial_casts, trivial_numeric_casts, unused_import_braces)]

pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::shell::{create_shell, create_simple_shell, Shell, ShellConfig};
pub use crate::util::BshExitStatusExt;

#[allow(missing_docs)]
mod builtins;
mod editor;
#[allow(missing_docs)]
pub mod errors;
#[allow(missing_docs, unsafe_code)]
mod executor;
#[allow(missing_docs)]
pub mod foreground;
#[allow(missing_docs)]
pub mod job_table;
#[allow(missing_docs)]
mod reaper;
#[allow(missing_docs)]
mod redirection;
#[allow(missing_docs)]
mod reporter;
#[allow(missing_docs, unsafe_code)]
pub mod signal;
#[allow(missing_docs)]
pub mod shell;
#[allow(missing_docs)]
pub mod terminal;
#[allow(missing_docs)]
pub mod tokenizer;
mod util;

pub use crate::executor::{execute, execute_line};
