//! Redirection & Pipe Builder (spec §4.4). Consumes a token sequence for a
//! single pipeline stage, opens any requested files, and returns the
//! operand words with redirection tokens stripped.

use std::os::unix::io::RawFd;

use nix::fcntl::{self, FcntlArg, FdFlag, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;

use crate::errors::{Error, Result};
use crate::tokenizer::Token;

/// Permission bits granted to a file created by output redirection:
/// read/write/execute for the owner only.
const CREATE_MODE: Mode = Mode::S_IRWXU;

/// The operand words for one stage, plus any descriptors the redirection
/// tokens opened. `-1`-equivalent absence is modeled as `None`.
pub struct Redirected {
    pub words: Vec<String>,
    pub input_fd: Option<RawFd>,
    pub output_fd: Option<RawFd>,
}

/// Strips redirection tokens out of `tokens`, opening the files they name.
/// "Last redirection wins": a second `<` or `>` closes the descriptor the
/// first one opened before replacing it. Opened descriptors are marked
/// close-on-exec so a later external-program exec doesn't inherit them
/// (they're explicitly `dup2`'d onto stdin/stdout by the Executor instead).
pub fn build(tokens: &[Token]) -> Result<Redirected> {
    let mut words = Vec::new();
    let mut input_fd: Option<RawFd> = None;
    let mut output_fd: Option<RawFd> = None;

    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        match token {
            Token::Input => {
                let path = next_operand(&mut iter)?;
                if let Some(fd) = input_fd.take() {
                    let _ = unistd::close(fd);
                }
                let fd = fcntl::open(path.as_str(), OFlag::O_RDONLY, Mode::empty())?;
                mark_cloexec(fd)?;
                input_fd = Some(fd);
            }
            Token::Output => {
                let path = next_operand(&mut iter)?;
                if let Some(fd) = output_fd.take() {
                    let _ = unistd::close(fd);
                }
                let fd = fcntl::open(
                    path.as_str(),
                    OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
                    CREATE_MODE,
                )?;
                mark_cloexec(fd)?;
                output_fd = Some(fd);
            }
            Token::Word(word) => words.push(word.clone()),
            // Consumed by the caller before/around this builder: T_BGJOB is
            // stripped by the top-level dispatch, T_PIPE splits stages.
            Token::Pipe | Token::BgJob => {}
        }
    }

    Ok(Redirected {
        words,
        input_fd,
        output_fd,
    })
}

fn next_operand<'a, I: Iterator<Item = &'a Token>>(
    iter: &mut std::iter::Peekable<I>,
) -> Result<String> {
    match iter.next() {
        Some(Token::Word(word)) => Ok(word.clone()),
        _ => Err(Error::syntax("redirection with no following word")),
    }
}

fn mark_cloexec(fd: RawFd) -> Result<()> {
    fcntl::fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn strips_markers_and_keeps_operands() {
        let tokens = tokenize("echo hi").unwrap();
        let redirected = build(&tokens).unwrap();
        assert_eq!(redirected.words, vec!["echo", "hi"]);
        assert!(redirected.input_fd.is_none());
        assert!(redirected.output_fd.is_none());
    }

    #[test]
    fn last_redirection_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, "from a").unwrap();
        std::fs::write(&b, "from b").unwrap();

        let line = format!("cmd < {} < {}", a.display(), b.display());
        let tokens = tokenize(&line).unwrap();
        let redirected = build(&tokens).unwrap();

        let fd = redirected.input_fd.expect("input descriptor opened");
        let mut buf = Vec::new();
        {
            use std::io::Read;
            use std::os::unix::io::FromRawFd;
            let mut file = unsafe { std::fs::File::from_raw_fd(fd) };
            file.read_to_end(&mut buf).unwrap();
        }
        assert_eq!(buf, b"from b");
    }

    #[test]
    fn missing_redirection_target_is_syntax_error() {
        let tokens = vec![Token::Word("cmd".into()), Token::Input];
        assert!(build(&tokens).is_err());
    }
}
