//! Shell context (spec §9 "Global state" design note): the Job Table, the
//! terminal duplicate and saved modes, and the line editor are process-wide
//! in the original design. Here they're packaged as a single `Shell`
//! struct passed explicitly to every component, constructed once at
//! startup and torn down once at shutdown.

use std::env;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::editor::Editor;
use crate::errors::Result;
use crate::job_table::JobTable;
use crate::signal;
use crate::terminal::Terminal;

const HISTORY_FILE_NAME: &str = ".jcsh_history";

/// Policy object controlling a [`Shell`]'s behavior. The only two shapes
/// that exist are `interactive` (the real CLI, spec §6) and
/// `noninteractive` (unit/integration tests that construct a `Shell`
/// without a real controlling terminal -- see SPEC_FULL §10.3/§10.6).
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Whether command lines are recorded to the in-memory history window
    /// and persisted to `~/.jcsh_history`.
    pub enable_command_history: bool,
    /// Capacity of the in-memory history window.
    pub command_history_capacity: usize,
    /// Whether the shell owns a controlling terminal and runs job control
    /// (process groups, terminal handoff, the signal handlers of spec §6).
    pub enable_job_control: bool,
}

impl ShellConfig {
    /// The configuration the real CLI entry point always uses.
    pub fn interactive(command_history_capacity: usize) -> ShellConfig {
        ShellConfig {
            enable_command_history: true,
            command_history_capacity,
            enable_job_control: true,
        }
    }

    /// A configuration with no controlling terminal and no history file,
    /// used to construct a `Shell` in a test process that isn't attached
    /// to a tty.
    pub fn noninteractive() -> ShellConfig {
        ShellConfig {
            enable_command_history: false,
            command_history_capacity: 0,
            enable_job_control: false,
        }
    }
}

/// The shell-global state of spec §3: the Job Table, the Terminal
/// Controller, and the line editor, plus bookkeeping the core's external
/// collaborators need (command history file, last exit status for the
/// prompt).
pub struct Shell {
    /// The Job Table (spec §4.2).
    pub jobs: JobTable,
    /// The Terminal Controller (spec §4.1).
    pub terminal: Terminal,
    /// Line editor and history (SPEC_FULL §10.5).
    pub editor: Editor,
    config: ShellConfig,
    history_file: Option<PathBuf>,
    /// Exit status of the last foreground command, shown in the prompt.
    last_exit_status: i32,
    /// Set by the `exit` builtin; the prompt loop checks this after every
    /// dispatch and, if set, shuts down with this code instead of reading
    /// another line.
    exit_requested: Option<i32>,
    /// Whether `exit` has already warned once this session about stopped
    /// jobs (bash lets a second `exit` force the issue).
    exit_warning_issued: bool,
}

impl Shell {
    fn assemble(config: ShellConfig, terminal: Terminal) -> Result<Shell> {
        let mut shell = Shell {
            jobs: JobTable::new(),
            terminal,
            editor: Editor::with_capacity(config.command_history_capacity),
            config,
            history_file: None,
            last_exit_status: 0,
            exit_requested: None,
            exit_warning_issued: false,
        };

        if config.enable_command_history {
            shell.history_file = dirs::home_dir().map(|p| p.join(HISTORY_FILE_NAME));
            if let Some(path) = shell.history_file.clone() {
                if let Err(e) = shell.editor.load_history(&path) {
                    if !is_not_found(&e) {
                        return Err(e);
                    }
                }
            } else {
                error!("failed to determine jcsh history file path");
            }
        }

        Ok(shell)
    }

    /// Constructs a new shell. For an interactive configuration this claims
    /// the controlling terminal and installs the shell's signal
    /// dispositions (spec component 7, Lifecycle); for a non-interactive
    /// one it skips straight to a [`Terminal::detached`] handle. The signal
    /// dispositions are installed either way: the Reaper's `sigsuspend`
    /// wait only ever wakes for a signal that actually runs a handler, so a
    /// shell that forked a real job but never installed SIGCHLD's handler
    /// could suspend forever waiting for one that will never be delivered.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        signal::install_handlers()?;
        if config.enable_job_control {
            ensure_own_process_group();
            let terminal = Terminal::init()?;
            let shell = Shell::assemble(config, terminal)?;
            info!("jcsh started up");
            Ok(shell)
        } else {
            Shell::assemble(config, Terminal::detached())
        }
    }

    /// The prompt string (spec §6: the literal `# `). When job control is
    /// disabled the prompt is never actually drawn by a caller that cares,
    /// but the method stays uniform with the interactive path.
    pub fn prompt(&self) -> &'static str {
        "# "
    }

    /// Reads one line from the terminal, performing `!`-history expansion
    /// first (SPEC_FULL §11).
    pub fn read_line(&mut self) -> Result<String> {
        let mut line = self.editor.readline(self.prompt())?;
        if self.config.enable_command_history {
            self.editor.expand_history(&mut line)?;
        }
        Ok(line)
    }

    /// Records a line in history, unless history is disabled.
    pub fn record_history(&mut self, line: &str) {
        if self.config.enable_command_history && !line.is_empty() {
            self.editor.add_history_entry(line);
        }
    }

    pub fn set_last_exit_status(&mut self, code: i32) {
        self.last_exit_status = code;
    }

    pub fn last_exit_status(&self) -> i32 {
        self.last_exit_status
    }

    pub fn job_control_enabled(&self) -> bool {
        self.config.enable_job_control
    }

    /// Reaps and prints every background job that has finished since the
    /// last prompt (spec §4.8), called once before each new prompt is
    /// drawn. Still-running or still-stopped jobs are silent here; they
    /// were already announced once, at the moment they were backgrounded
    /// or suspended.
    pub fn report_jobs(&mut self) {
        crate::reporter::report(&mut self.jobs, crate::reporter::Filter::Finished);
    }

    /// Whether any job table slot (foreground or background) is occupied.
    pub fn has_jobs(&self) -> bool {
        (0..self.jobs.len()).any(|i| self.jobs.is_occupied(i))
    }

    /// Records that `exit` should end the prompt loop with `code` once the
    /// current dispatch returns.
    pub fn request_exit(&mut self, code: i32) {
        self.exit_requested = Some(code);
    }

    /// The code passed to [`Shell::request_exit`], if `exit` has run.
    pub fn exit_requested(&self) -> Option<i32> {
        self.exit_requested
    }

    /// Whether `exit` has already printed its "There are stopped jobs"
    /// warning once this session.
    pub fn exit_warning_issued(&self) -> bool {
        self.exit_warning_issued
    }

    pub fn set_exit_warning_issued(&mut self, issued: bool) {
        self.exit_warning_issued = issued;
    }

    /// Terminates every remaining job and releases the terminal (spec
    /// §4.9). Blocks the child-signal for the duration, restoring the
    /// prior mask on every exit path via [`signal::ChildSignalBlock`].
    pub fn shutdown(&mut self) -> Result<()> {
        let block = signal::ChildSignalBlock::enter()?;

        let pgids: Vec<_> = (0..self.jobs.len())
            .filter(|&i| self.jobs.is_occupied(i))
            .filter_map(|i| self.jobs.job(i).map(|j| j.pgid()))
            .collect();

        for pgid in pgids {
            let _ = signal::send_to_group(pgid, nix::sys::signal::Signal::SIGTERM);
            let _ = signal::send_to_group(pgid, nix::sys::signal::Signal::SIGCONT);
        }

        loop {
            crate::reaper::reap(&mut self.jobs);
            let still_running = (0..self.jobs.len()).any(|i| {
                matches!(
                    self.jobs.peek_state(i),
                    Some(crate::job_table::JobState::Running) | Some(crate::job_table::JobState::Stopped)
                )
            });
            if !still_running {
                break;
            }
            signal::suspend(&block.unblocked_mask());
        }

        crate::reporter::report(&mut self.jobs, crate::reporter::Filter::Finished);

        if self.config.enable_command_history {
            if let Some(path) = self.history_file.clone() {
                if let Err(e) = self.editor.save_history(&path) {
                    error!("failed to save history to file during shutdown: {}", e);
                }
            }
        }

        drop(block);
        self.terminal.close();
        info!("jcsh has shut down");
        Ok(())
    }
}

/// If the shell isn't already its own process group leader (e.g. it was
/// started from a pipeline or non-interactively and inherited another
/// process's group), make it one so the terminal can be handed to it and
/// back without disturbing whatever process group it was born into.
fn ensure_own_process_group() {
    use nix::unistd::{self, Pid};
    if unistd::getpgrp() != unistd::getpid() {
        let _ = unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0));
    }
}

fn is_not_found(e: &crate::errors::Error) -> bool {
    use crate::errors::ErrorKind;
    matches!(e.kind(), ErrorKind::HistoryFileNotFound)
}

/// Builds the shell used by the real CLI entry point.
pub fn create_shell(command_history_capacity: usize) -> Result<Shell> {
    Shell::new(ShellConfig::interactive(command_history_capacity))
}

/// Builds a shell with no controlling terminal, for use by tests.
pub fn create_simple_shell() -> Result<Shell> {
    Shell::new(ShellConfig::noninteractive())
}

/// Whether standard input is attached to a terminal (spec §6 CLI surface:
/// the shell requires this and exits with an error otherwise).
pub fn stdin_is_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

pub fn current_dir_display() -> String {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match dirs::home_dir() {
        Some(home) => match cwd.strip_prefix(&home) {
            Ok(rel) if rel.as_os_str().is_empty() => "~".to_string(),
            Ok(rel) => Path::new("~").join(rel).display().to_string(),
            Err(_) => cwd.display().to_string(),
        },
        None => cwd.display().to_string(),
    }
}
