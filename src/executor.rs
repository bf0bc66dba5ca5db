//! Executor (spec §4.5 single-stage, §4.6 pipeline). Forks one child per
//! pipeline stage, wires stdin/stdout through pipes and any explicit
//! redirections, and puts every stage in one process group so the Terminal
//! Controller and Foreground Monitor can treat the pipeline as one job.
//!
//! A foreground, non-backgrounded, single-stage builtin is the one
//! exception: it runs directly in the shell process (spec §4.9's "builtins
//! run in the shell itself" note) rather than being forked. Every other
//! shape -- backgrounded builtins, and builtins used as one stage of a
//! pipeline -- is forked like an external command and resolves the spec's
//! open question on builtin exit codes by calling `std::process::exit`.

use std::os::unix::io::RawFd;
use std::os::unix::process::CommandExt;
use std::process::Command;

use nix::unistd::{self, ForkResult, Pid};

use crate::builtins;
use crate::errors::{Error, Result};
use crate::redirection::{self, Redirected};
use crate::shell::Shell;
use crate::signal::{self, ChildSignalBlock};
use crate::tokenizer::Token;

/// Entry point for one tokenized command line (spec §4.4's "caller handles
/// T_BGJOB before dispatch and splits on T_PIPE"). Strips a trailing `&`,
/// splits the remaining tokens into pipeline stages on `|`, and dispatches
/// to the single-stage or pipeline path. Returns the foreground job's exit
/// code once reaped, or `None` if the job was backgrounded (its completion
/// is reported later by [`crate::reporter`]) or ran as a direct, unforked
/// builtin. An empty command line (no operand tokens at all) is a no-op.
pub fn execute_line(shell: &mut Shell, mut tokens: Vec<Token>) -> Result<Option<i32>> {
    let background = matches!(tokens.last(), Some(Token::BgJob));
    if background {
        tokens.pop();
    }

    let stages = split_stages(tokens)?;
    if stages.iter().all(Vec::is_empty) {
        return Ok(None);
    }

    execute(shell, stages, background)
}

/// Splits tokens into pipeline stages on `|`. An empty stage (leading,
/// trailing, or doubled pipe) is a syntax error (spec §7 "Malformed
/// command").
fn split_stages(tokens: Vec<Token>) -> Result<Vec<Vec<Token>>> {
    let mut stages = vec![Vec::new()];
    for token in tokens {
        if token == Token::Pipe {
            stages.push(Vec::new());
        } else {
            stages.last_mut().unwrap().push(token);
        }
    }

    if stages.len() > 1 && stages.iter().any(|stage| first_word(stage).is_none()) {
        return Err(Error::syntax("empty pipeline stage"));
    }

    Ok(stages)
}

/// Runs one command line's pipeline. `stages` holds one token slice per
/// `|`-separated stage; `background` is whether a trailing `&` was present.
pub fn execute(shell: &mut Shell, stages: Vec<Vec<Token>>, background: bool) -> Result<Option<i32>> {
    if stages.len() == 1 && !background {
        if let Some(word) = first_word(&stages[0]) {
            if builtins::is_builtin(&word) {
                return run_builtin_in_shell(shell, &stages[0]).map(Some);
            }
        }
    }

    run_forked(shell, stages, background)
}

fn first_word(tokens: &[Token]) -> Option<String> {
    tokens.iter().find_map(|token| match token {
        Token::Word(word) => Some(word.clone()),
        _ => None,
    })
}

/// Runs a foreground builtin directly in the shell process, with any
/// redirections applied around the call and undone afterward. Builtins run
/// this way never enter the job table -- the model only tracks processes a
/// fork actually created.
fn run_builtin_in_shell(shell: &mut Shell, tokens: &[Token]) -> Result<i32> {
    let redirected = redirection::build(tokens)?;
    if redirected.words.is_empty() {
        return Ok(0);
    }

    let saved_in = match redirected.input_fd {
        Some(fd) => Some(swap_std_fd(0, fd)?),
        None => None,
    };
    let saved_out = match redirected.output_fd {
        Some(fd) => Some(swap_std_fd(1, fd)?),
        None => None,
    };

    let result = builtins::dispatch(shell, &redirected.words);

    if let Some(saved) = saved_in {
        restore_std_fd(0, saved);
    }
    if let Some(saved) = saved_out {
        restore_std_fd(1, saved);
    }
    if let Some(fd) = redirected.input_fd {
        let _ = unistd::close(fd);
    }
    if let Some(fd) = redirected.output_fd {
        let _ = unistd::close(fd);
    }

    match result {
        Some(result) => result,
        None => Err(Error::command_not_found(redirected.words[0].clone())),
    }
}

fn swap_std_fd(std_fd: RawFd, new_fd: RawFd) -> Result<RawFd> {
    let saved = unistd::dup(std_fd)?;
    unistd::dup2(new_fd, std_fd)?;
    Ok(saved)
}

fn restore_std_fd(std_fd: RawFd, saved: RawFd) {
    let _ = unistd::dup2(saved, std_fd);
    let _ = unistd::close(saved);
}

/// Forks one child per stage, chaining their stdin/stdout through pipes,
/// collects them into one job under one process group, and either hands the
/// group the terminal and waits (foreground) or reports it and returns
/// immediately (background).
fn run_forked(shell: &mut Shell, stages: Vec<Vec<Token>>, background: bool) -> Result<Option<i32>> {
    let stage_count = stages.len();
    let mut redirecteds = Vec::with_capacity(stage_count);
    for stage in &stages {
        redirecteds.push(redirection::build(stage)?);
    }
    if redirecteds.iter().all(|r| r.words.is_empty()) {
        return Ok(None);
    }
    let command_argv: Vec<Vec<String>> = redirecteds.iter().map(|r| r.words.clone()).collect();

    let block = ChildSignalBlock::enter()?;

    let mut pgid: Option<Pid> = None;
    let mut pids = Vec::with_capacity(stage_count);
    let mut prev_read: Option<RawFd> = None;

    for (i, redirected) in redirecteds.iter().enumerate() {
        let is_last = i + 1 == stage_count;
        let pipe_fds = if is_last { None } else { Some(unistd::pipe()?) };

        match unsafe { unistd::fork()? } {
            ForkResult::Parent { child } => {
                // Double setpgid: both parent and child set the child's
                // group, defeating the race where either one runs first.
                let group = pgid.unwrap_or(child);
                let _ = unistd::setpgid(child, group);
                pgid.get_or_insert(child);
                pids.push(child);

                if let Some(fd) = prev_read.take() {
                    let _ = unistd::close(fd);
                }
                if let Some((read_fd, write_fd)) = pipe_fds {
                    let _ = unistd::close(write_fd);
                    prev_read = Some(read_fd);
                }
            }
            ForkResult::Child => {
                let group = pgid.unwrap_or_else(unistd::getpid);
                let _ = unistd::setpgid(Pid::from_raw(0), group);
                child_after_fork(shell, redirected, prev_read, pipe_fds, &command_argv[i], group, background);
            }
        }
    }

    if let Some(fd) = prev_read {
        let _ = unistd::close(fd);
    }
    for redirected in &redirecteds {
        if let Some(fd) = redirected.input_fd {
            let _ = unistd::close(fd);
        }
        if let Some(fd) = redirected.output_fd {
            let _ = unistd::close(fd);
        }
    }

    let pgid = pgid.expect("at least one stage was forked");
    let tmodes = shell.terminal.save_job_tmodes();
    let index = shell.jobs.add_job(pgid, background, tmodes);
    for (argv, pid) in command_argv.iter().zip(pids.iter()) {
        shell.jobs.add_process(index, *pid, argv);
    }

    drop(block);

    if background {
        let command = shell.jobs.command_of(index).unwrap_or_default();
        println!("[{}] running '{}'", index, command);
        Ok(None)
    } else {
        shell.terminal.set_foreground(pgid)?;
        crate::foreground::monitor(shell)
    }
}

/// Runs in the forked child: claims the terminal (if foreground), wires up
/// stdin/stdout, restores default signal dispositions, unblocks SIGCHLD (it
/// survives `execve`), and then either execs an external program or runs a
/// builtin and exits with its code. Never returns.
///
/// Claiming the terminal here, in addition to the parent's claim after the
/// whole fork loop completes (`run_forked`), mirrors both `do_job` and
/// `do_stage` in the original (`setfgpgrp` in parent and child alike): the
/// child resets SIGTTIN/SIGTTOU to their default dispositions just below,
/// so if it touched the terminal before the parent's deferred `tcsetpgrp`
/// runs, it would stop itself on those signals instead of proceeding.
fn child_after_fork(
    shell: &mut Shell,
    redirected: &Redirected,
    prev_read: Option<RawFd>,
    pipe_fds: Option<(RawFd, RawFd)>,
    argv: &[String],
    group: Pid,
    background: bool,
) -> ! {
    if !background {
        let _ = shell.terminal.set_foreground(group);
    }

    let _ = signal::reset_child_dispositions();
    let _ = signal::unblock_child_signal();

    if let Some(fd) = prev_read {
        let _ = unistd::dup2(fd, 0);
        let _ = unistd::close(fd);
    } else if let Some(fd) = redirected.input_fd {
        let _ = unistd::dup2(fd, 0);
    }

    if let Some((read_fd, write_fd)) = pipe_fds {
        let _ = unistd::close(read_fd);
        let _ = unistd::dup2(write_fd, 1);
        let _ = unistd::close(write_fd);
    } else if let Some(fd) = redirected.output_fd {
        let _ = unistd::dup2(fd, 1);
    }

    if let Some(fd) = redirected.input_fd {
        let _ = unistd::close(fd);
    }
    if let Some(fd) = redirected.output_fd {
        let _ = unistd::close(fd);
    }

    if argv.is_empty() {
        std::process::exit(0);
    }

    if builtins::is_builtin(&argv[0]) {
        let code = match builtins::dispatch(shell, argv) {
            Some(Ok(code)) => code,
            Some(Err(_)) => 1,
            None => 127,
        };
        std::process::exit(code);
    }

    let err = Command::new(&argv[0]).args(&argv[1..]).exec();
    eprintln!("{}: {}", argv[0], err);
    std::process::exit(127);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::create_simple_shell;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn foreground_external_command_returns_its_exit_code() {
        let mut shell = create_simple_shell().unwrap();
        let stages = vec![vec![word("true")]];
        let code = execute(&mut shell, stages, false).unwrap();
        assert_eq!(code, Some(0));

        let stages = vec![vec![word("false")]];
        let code = execute(&mut shell, stages, false).unwrap();
        assert_eq!(code, Some(1));
    }

    #[test]
    fn background_job_is_registered_and_reaped() {
        let mut shell = create_simple_shell().unwrap();
        let stages = vec![vec![word("true")]];
        let code = execute(&mut shell, stages, true).unwrap();
        assert_eq!(code, None, "a backgrounded job's completion is reported later, not returned");
        assert!(shell.jobs.is_occupied(1));

        for _ in 0..200 {
            crate::reaper::reap(&mut shell.jobs);
            if shell.jobs.peek_state(1) == Some(crate::job_table::JobState::Finished) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(shell.jobs.peek_state(1), Some(crate::job_table::JobState::Finished));
    }

    #[test]
    fn pipeline_chains_stdout_to_stdin_across_stages() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in");
        let output_path = dir.path().join("out");
        std::fs::write(&input_path, "banana").unwrap();

        let mut shell = create_simple_shell().unwrap();
        let stages = vec![
            vec![word("cat"), Token::Input, word(input_path.to_str().unwrap())],
            vec![
                word("tr"),
                word("a"),
                word("A"),
                Token::Output,
                word(output_path.to_str().unwrap()),
            ],
        ];
        let code = execute(&mut shell, stages, false).unwrap();
        assert_eq!(code, Some(0));

        let contents = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(contents, "bAnAnA");
    }

    #[test]
    fn empty_command_line_creates_no_job() {
        let mut shell = create_simple_shell().unwrap();
        let code = execute_line(&mut shell, Vec::new()).unwrap();
        assert_eq!(code, None);
        assert!(!shell.jobs.is_occupied(0));
    }

    #[test]
    fn empty_pipeline_stage_is_a_syntax_error() {
        let tokens = vec![word("cat"), Token::Pipe, Token::Pipe, word("tr")];
        assert!(execute_line(&mut create_simple_shell().unwrap(), tokens).is_err());
    }
}
