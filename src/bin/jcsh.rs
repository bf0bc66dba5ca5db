//! CLI entry point (SPEC_FULL §10.4, teacher's `src/bin/bsh.rs`). Checks
//! stdin is a tty, installs logging, runs the prompt loop to completion,
//! and translates the shell's own exit code into the process's.

use std::io::Write;
use std::process;

use log::{debug, error};

use jcsh::errors::{Error, Result};
use jcsh::{create_shell, BshExitStatusExt, Shell};

const COMMAND_HISTORY_CAPACITY: usize = 1000;
const LOG_FILE_NAME: &str = ".jcsh_log";

fn main() {
    if std::env::args().any(|arg| arg == "--version") {
        println!("jcsh version {}", env!("CARGO_PKG_VERSION"));
        process::exit(0);
    }

    init_logger();

    if !jcsh::shell::stdin_is_tty() {
        eprintln!("jcsh: standard input is not a terminal; job control requires an interactive tty");
        process::exit(std::process::ExitStatus::from_failure().code().unwrap_or(1));
    }

    let mut shell = create_shell(COMMAND_HISTORY_CAPACITY).unwrap_or_else(|e| {
        error!("failed to start up: {}", e);
        eprintln!("jcsh: {}", e);
        process::exit(std::process::ExitStatus::from_failure().code().unwrap_or(1));
    });

    let code = run(&mut shell);

    if let Err(e) = shell.shutdown() {
        error!("error during shutdown: {}", e);
        eprintln!("jcsh: {}", e);
    }

    process::exit(code);
}

fn init_logger() {
    let mut log_path = match dirs::home_dir() {
        Some(path) => path,
        None => return,
    };
    log_path.push(LOG_FILE_NAME);

    let file = match fern::log_file(&log_path) {
        Ok(file) => file,
        Err(_) => {
            eprintln!("jcsh: failed to open log file {}", log_path.display());
            return;
        }
    };

    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(file)
        .apply();

    if result.is_err() {
        eprintln!("jcsh: failed to initialize logging");
    }
}

/// Runs the read-tokenize-execute-report loop until EOF or `exit`. Returns
/// the process exit code (spec §6 "Exit code").
fn run(shell: &mut Shell) -> i32 {
    loop {
        if let Some(code) = shell.exit_requested() {
            return code;
        }

        match shell.read_line() {
            Ok(line) => {
                shell.record_history(&line);
                if let Err(e) = dispatch_line(shell, &line) {
                    print_error(&e);
                }
                shell.report_jobs();
            }
            Err(e) => {
                if is_eof(&e) {
                    return shell.last_exit_status();
                }
                print_error(&e);
            }
        }
    }
}

fn dispatch_line(shell: &mut Shell, line: &str) -> Result<()> {
    let tokens = jcsh::tokenizer::tokenize(line)?;
    debug!("tokenized line: {:?}", tokens);
    if let Some(code) = jcsh::execute_line(shell, tokens)? {
        shell.set_last_exit_status(code);
    }
    Ok(())
}

fn print_error(e: &Error) {
    error!("{}", e);
    eprintln!("jcsh: {}", e);
    let _ = std::io::stdout().flush();
}

fn is_eof(e: &Error) -> bool {
    use jcsh::errors::ErrorKind;
    use rustyline::error::ReadlineError;
    matches!(e.kind(), ErrorKind::ReadlineError(ReadlineError::Eof))
}
