//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Nix(::nix::Error);
        ReadlineError(::rustyline::error::ReadlineError);
    }

    errors {
        /// A command line could not be tokenized, e.g. an empty pipeline stage
        /// (`cmd1 | | cmd2`) or a redirection token with no following word.
        Syntax(line: String) {
            description("syntax error")
            display("syntax error near: {}", line)
        }
        /// A builtin returned a non-zero status. `code` is reported to the
        /// job table as the builtin's exit status.
        BuiltinCommand(message: String, code: i32) {
            description("builtin command error")
            display("{}", message)
        }
        /// The external program named by the first word of a pipeline stage
        /// does not exist on `PATH`.
        CommandNotFound(command: String) {
            display("{}: command not found", command)
        }
        /// `fg`/`bg`/`kill` referenced a job id that is not in the job table.
        NoSuchJob(job: String) {
            display("{}: no such job", job)
        }
        /// `fg`/`bg` used on a shell built without job control (non-interactive).
        NoJobControl {
            display("no job control in this shell")
        }
        /// The history file has never been written; not a fatal condition.
        HistoryFileNotFound {
            display("history file not found")
        }
    }
}

impl Error {
    /// A command line could not be tokenized.
    pub fn syntax<S: Into<String>>(line: S) -> Error {
        ErrorKind::Syntax(line.into()).into()
    }

    /// A builtin failed; `code` becomes the job's reported exit status.
    pub fn builtin_command<S: Into<String>>(message: S, code: i32) -> Error {
        ErrorKind::BuiltinCommand(message.into(), code).into()
    }

    /// The named program is not on `PATH`.
    pub fn command_not_found<S: Into<String>>(command: S) -> Error {
        ErrorKind::CommandNotFound(command.into()).into()
    }

    /// `fg`/`bg`/`kill` referenced a job id outside the table.
    pub fn no_such_job<S: Into<String>>(job: S) -> Error {
        ErrorKind::NoSuchJob(job.into()).into()
    }

    /// Job control operation attempted on a shell without job control.
    pub fn no_job_control() -> Error {
        ErrorKind::NoJobControl.into()
    }

    /// The history file has never been written.
    pub fn history_file_not_found() -> Error {
        ErrorKind::HistoryFileNotFound.into()
    }
}
