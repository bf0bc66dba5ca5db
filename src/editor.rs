//! Line editor and history (spec §10 ambient stack, SPEC_FULL §11): wraps
//! `rustyline` for interactive line reading and arrow-key recall, and keeps
//! its own capacity-bounded history window so `!n` / `!-n` / `!prefix`
//! expansion can be implemented without reaching into rustyline's internals.

use std::fmt;
use std::path::Path;

use rustyline::{CompletionType, Config};

use crate::errors::{Error, Result};

pub struct Editor {
    internal: rustyline::Editor<()>,
    /// A capacity-bounded window of the most recent entries.
    entries: Vec<String>,
    /// The number of entries ever added, including ones since dropped from
    /// `entries` -- needed so `!n` keeps referring to the same absolute
    /// position even after the window rolls over.
    history_count: usize,
    history_capacity: usize,
}

impl Editor {
    pub fn with_capacity(capacity: usize) -> Editor {
        let config = Config::builder()
            .max_history_size(capacity)
            .history_ignore_space(true)
            .completion_type(CompletionType::Circular)
            .build();

        Editor {
            internal: rustyline::Editor::with_config(config),
            entries: Vec::new(),
            history_count: 0,
            history_capacity: capacity,
        }
    }

    /// Reads one line from the terminal, with arrow-key history recall.
    pub fn readline(&mut self, prompt: &str) -> Result<String> {
        let line = self.internal.readline(prompt)?;
        Ok(line)
    }

    pub fn load_history<P: AsRef<Path> + ?Sized>(&mut self, path: &P) -> Result<()> {
        if !path.as_ref().exists() {
            return Err(Error::history_file_not_found());
        }
        self.internal.load_history(path)?;
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                self.push_entry(line.to_string());
            }
        }
        Ok(())
    }

    pub fn save_history<P: AsRef<Path> + ?Sized>(&mut self, path: &P) -> Result<()> {
        self.internal.save_history(path)?;
        Ok(())
    }

    /// Records a line in both rustyline's own history (for arrow-key recall)
    /// and our own window (for `!`-expansion). Consecutive duplicates are
    /// ignored, matching ordinary shell history behavior.
    pub fn add_history_entry(&mut self, job: &str) {
        if self.entries.last().map(|last| last.as_str()) == Some(job) {
            return;
        }
        self.internal.add_history_entry(job);
        self.push_entry(job.to_string());
    }

    fn push_entry(&mut self, line: String) {
        self.entries.push(line);
        self.history_count += 1;
        if self.entries.len() > self.history_capacity {
            self.entries.remove(0);
        }
    }

    /// Get the history entry at an absolute position.
    pub fn get_history_entry(&self, abs_pos: usize) -> Option<&String> {
        let begin = self.history_count.checked_sub(self.entries.len()).unwrap_or(0);
        if abs_pos < begin || abs_pos >= self.history_count {
            return None;
        }
        self.entries.get(abs_pos - begin)
    }

    /// Set maximum number of remembered history entries. If `size` is
    /// smaller than the current window, the oldest entries are dropped.
    pub fn set_history_max_size(&mut self, size: usize) {
        self.history_capacity = size;
        while self.entries.len() > self.history_capacity {
            self.entries.remove(0);
        }
    }

    pub fn get_history_count(&self) -> usize {
        self.history_count
    }

    pub fn clear_history(&mut self) {
        self.internal.clear_history();
        self.entries.clear();
        self.history_count = 0;
    }

    /// Performs `!n` / `!-n` / `!prefix` history expansion in place. `!0` and
    /// an out-of-range reference are reported as "event not found", matching
    /// the original shell's message.
    pub fn expand_history(&self, command: &mut String) -> Result<()> {
        if !command.starts_with('!') {
            return Ok(());
        }

        let arg = command[1..].to_string();
        let entry = match arg.parse::<isize>() {
            Ok(0) => None,
            Ok(n) if n > 0 => self.get_history_entry((n - 1) as usize),
            Ok(n) => self
                .history_count
                .checked_sub(n.unsigned_abs())
                .and_then(|i| self.get_history_entry(i)),
            Err(_) => self.entries.iter().rev().find(|entry| entry.starts_with(arg.as_str())),
        };

        match entry {
            Some(line) => {
                let line = line.clone();
                command.clear();
                command.push_str(&line);
            }
            None => {
                return Err(Error::builtin_command(format!("{}: event not found", command), 1));
            }
        }

        Ok(())
    }

    pub fn enumerate_history_entries(&self) -> EditorEnumerate {
        let start = self.history_count.checked_sub(self.entries.len()).unwrap_or(0);
        EditorEnumerate { editor: self, pos: start }
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, e) in self.enumerate_history_entries() {
            writeln!(f, "\t{}\t{}", i + 1, e)?;
        }
        Ok(())
    }
}

pub struct EditorEnumerate<'a> {
    editor: &'a Editor,
    pos: usize,
}

impl<'a> Iterator for EditorEnumerate<'a> {
    type Item = (usize, &'a String);

    fn next(&mut self) -> Option<(usize, &'a String)> {
        let v = self.editor.get_history_entry(self.pos).map(|e| (self.pos, e));
        if v.is_some() {
            self.pos += 1;
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc_history_state(capacity: usize, full: usize) -> Editor {
        assert!(full <= capacity);
        let mut state = Editor::with_capacity(capacity);
        for i in 0..full {
            state.add_history_entry(&format!("cmd{}", i));
        }
        state
    }

    #[test]
    fn init_with_capacity() {
        let capacity = 10;
        let state = Editor::with_capacity(capacity);
        assert!(state.entries.is_empty());
        assert_eq!(state.history_count, 0);
        assert_eq!(state.history_capacity, capacity);
    }

    #[test]
    fn clear() {
        let capacity = 10;
        let mut state = alloc_history_state(capacity, 5);
        state.clear_history();
        assert!(state.entries.is_empty());
        assert_eq!(state.history_count, 0);
        assert_eq!(state.history_capacity, capacity);
    }

    #[test]
    fn add_history_entry_duplicate() {
        let mut state = Editor::with_capacity(2);

        let item = "dup";
        state.add_history_entry(item);
        assert_eq!(state.entries.len(), 1);

        state.add_history_entry(item);
        assert_eq!(state.entries.len(), 1);
    }

    #[test]
    fn add_history_entry_rollover() {
        let mut state = alloc_history_state(10, 10);
        state.add_history_entry("extra");
        assert_eq!(state.history_count, 11);
        assert_eq!(state.entries.len(), 10);
    }

    #[test]
    fn expand_empty_command() {
        let mut buf = String::new();
        let state = alloc_history_state(1, 1);
        assert!(state.expand_history(&mut buf).is_ok());
        assert!(buf.is_empty());
    }

    #[test]
    fn expand_empty_history() {
        let state = alloc_history_state(1, 0);

        let mut buf = String::new();
        assert!(state.expand_history(&mut buf).is_ok());
        assert!(buf.is_empty());

        let first_cmd = "!1";
        let mut buf = first_cmd.to_string();
        assert!(state.expand_history(&mut buf).is_err());
        assert_eq!(buf.as_str(), first_cmd);

        let last_cmd = "!-1";
        let mut buf = String::from(last_cmd);
        assert!(state.expand_history(&mut buf).is_err());
        assert_eq!(buf, last_cmd);
    }

    #[test]
    fn expand_positive_nth_command() {
        let (cap, full) = (10, 10);
        let state = alloc_history_state(cap, full);
        for i in 0..full {
            let mut buf = format!("!{}", i + 1);
            assert!(state.expand_history(&mut buf).is_ok());
            assert_eq!(buf, format!("cmd{}", i));
        }
    }

    #[test]
    fn expand_negative_nth_command() {
        let (cap, full) = (10, 10);
        let state = alloc_history_state(cap, full);
        for i in 0..full {
            let mut buf = format!("!-{}", i + 1);
            assert!(state.expand_history(&mut buf).is_ok());
            assert_eq!(buf, format!("cmd{}", full - i - 1));
        }
    }

    #[test]
    fn expand_string() {
        let state = alloc_history_state(10, 10);

        let mut buf = String::from("!c");
        assert!(state.expand_history(&mut buf).is_ok());
        assert_eq!(buf, "cmd9");

        buf = String::from("!cmd1");
        assert!(state.expand_history(&mut buf).is_ok());
        assert_eq!(buf, "cmd1");
    }
}
