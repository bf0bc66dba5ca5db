//! Job Table (spec §3, §4.2): an indexable collection of job slots. Slot 0
//! is reserved for the current foreground job; slots >= 1 hold background
//! jobs. The table grows on demand; freed slots are reused before growth.

use nix::sys::termios::Termios;
use nix::unistd::Pid;

/// The unit tracked by child-state notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Stopped,
    Finished,
}

/// One process within a job's pipeline.
#[derive(Clone, Debug)]
pub struct ProcessRecord {
    pid: Pid,
    state: ProcessState,
    /// Raw OS status word after termination; `None` before.
    exitcode: Option<i32>,
}

impl ProcessRecord {
    pub fn new(pid: Pid) -> Self {
        ProcessRecord {
            pid,
            state: ProcessState::Running,
            exitcode: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn exitcode(&self) -> Option<i32> {
        self.exitcode
    }

    pub fn set_running(&mut self) {
        self.state = ProcessState::Running;
    }

    pub fn set_stopped(&mut self) {
        self.state = ProcessState::Stopped;
    }

    pub fn set_finished(&mut self, exitcode: i32) {
        self.state = ProcessState::Finished;
        self.exitcode = Some(exitcode);
    }
}

/// Aggregate state of a job, derived from its processes (spec §3 invariant):
/// RUNNING iff all live (non-FINISHED) processes are RUNNING; STOPPED iff
/// all live processes are STOPPED; FINISHED iff every process is FINISHED.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Finished,
}

/// A group of processes sharing one process group.
#[derive(Clone, Debug)]
pub struct JobRecord {
    pgid: Pid,
    processes: Vec<ProcessRecord>,
    /// Stages joined by " | ", arguments within a stage joined by " ".
    command: String,
    /// Terminal modes captured when this job most recently lost the
    /// foreground; initially a copy of the shell's own modes. `None` for
    /// jobs started under a shell with no controlling terminal.
    saved_tmodes: Option<Termios>,
}

impl JobRecord {
    pub fn pgid(&self) -> Pid {
        self.pgid
    }

    pub fn processes(&self) -> &[ProcessRecord] {
        &self.processes
    }

    pub fn processes_mut(&mut self) -> &mut [ProcessRecord] {
        &mut self.processes
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn tmodes(&self) -> Option<&Termios> {
        self.saved_tmodes.as_ref()
    }

    pub fn set_tmodes(&mut self, tmodes: Option<Termios>) {
        self.saved_tmodes = tmodes;
    }

    fn push_process(&mut self, pid: Pid, argv: &[String]) {
        if !self.command.is_empty() {
            self.command.push_str(" | ");
        }
        self.command.push_str(&argv.join(" "));
        self.processes.push(ProcessRecord::new(pid));
    }

    /// Aggregate state derived from the processes (spec §3 invariant).
    pub fn state(&self) -> JobState {
        if self.processes.iter().all(|p| p.state() == ProcessState::Finished) {
            return JobState::Finished;
        }
        let live_stopped = self
            .processes
            .iter()
            .filter(|p| p.state() != ProcessState::Finished)
            .all(|p| p.state() == ProcessState::Stopped);
        if live_stopped {
            JobState::Stopped
        } else {
            JobState::Running
        }
    }

    /// The last pipeline stage's exit code, once it has one.
    pub fn last_exitcode(&self) -> Option<i32> {
        self.processes.last().and_then(|p| p.exitcode())
    }
}

/// An indexable collection of job slots. A free slot is represented by
/// `None` (spec's pgid=0 sentinel).
#[derive(Default)]
pub struct JobTable {
    slots: Vec<Option<JobRecord>>,
}

impl JobTable {
    pub fn new() -> Self {
        JobTable { slots: vec![None] }
    }

    /// Returns the lowest free slot >= 1, growing the table if none is free.
    pub fn alloc_background(&mut self) -> usize {
        for (i, slot) in self.slots.iter().enumerate().skip(1) {
            if slot.is_none() {
                return i;
            }
        }
        self.slots.push(None);
        self.slots.len() - 1
    }

    /// Registers a new job. For foreground jobs this overwrites slot 0,
    /// which must already be free by invariant; for background jobs this
    /// allocates a new slot via [`alloc_background`](Self::alloc_background).
    pub fn add_job(&mut self, pgid: Pid, background: bool, tmodes: Option<Termios>) -> usize {
        let index = if background { self.alloc_background() } else { 0 };
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        debug_assert!(self.slots[index].is_none());
        self.slots[index] = Some(JobRecord {
            pgid,
            processes: Vec::new(),
            command: String::new(),
            saved_tmodes: tmodes,
        });
        index
    }

    /// Appends a process to a job and extends the command rendering.
    pub fn add_process(&mut self, index: usize, pid: Pid, argv: &[String]) {
        if let Some(job) = self.slots[index].as_mut() {
            job.push_process(pid, argv);
        }
    }

    /// Moves a job record wholesale from `from` to `to`; `to` must be free.
    pub fn move_job(&mut self, from: usize, to: usize) {
        if to >= self.slots.len() {
            self.slots.resize_with(to + 1, || None);
        }
        debug_assert!(self.slots[to].is_none());
        self.slots[to] = self.slots[from].take();
    }

    /// Returns the job's current state. If FINISHED, the job is deleted
    /// from the table and its last-stage exit code is returned alongside.
    pub fn state_of(&mut self, index: usize) -> Option<(JobState, Option<i32>)> {
        let state = self.slots.get(index)?.as_ref()?.state();
        if state == JobState::Finished {
            let job = self.slots[index].take()?;
            Some((JobState::Finished, job.last_exitcode()))
        } else {
            Some((state, None))
        }
    }

    /// Like [`state_of`](Self::state_of) but never deletes a FINISHED job;
    /// used by read-only display paths (the `jobs` builtin) that must not
    /// have the side effect of freeing a slot just by looking at it.
    pub fn peek_state(&self, index: usize) -> Option<JobState> {
        Some(self.slots.get(index)?.as_ref()?.state())
    }

    pub fn command_of(&self, index: usize) -> Option<String> {
        self.slots.get(index)?.as_ref().map(|j| j.command.clone())
    }

    pub fn job(&self, index: usize) -> Option<&JobRecord> {
        self.slots.get(index)?.as_ref()
    }

    pub fn job_mut(&mut self, index: usize) -> Option<&mut JobRecord> {
        self.slots.get_mut(index)?.as_mut()
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.slots.get(index).map_or(false, |s| s.is_some())
    }

    /// Removes and returns a job's storage, freeing its slot.
    pub fn remove(&mut self, index: usize) -> Option<JobRecord> {
        self.slots.get_mut(index)?.take()
    }

    /// Finds the slot index holding a job with the given pgid.
    pub fn find_by_pgid(&self, pgid: Pid) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().map_or(false, |j| j.pgid() == pgid))
    }

    /// All occupied slots, in index order, paired with their index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &JobRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|j| (i, j)))
    }

    /// All occupied slots mutably, used by the Reaper to update process state.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut JobRecord)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|j| (i, j)))
    }

    /// The highest index with a non-empty slot, used to find "the most
    /// recently started" job for `fg`/`bg` with no explicit job id.
    pub fn last_occupied(&self) -> Option<usize> {
        self.slots.iter().rposition(|slot| slot.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_background_reuses_freed_slots() {
        let mut table = JobTable::new();
        let a = table.add_job(Pid::from_raw(100), true, None);
        let b = table.add_job(Pid::from_raw(101), true, None);
        assert_eq!(a, 1);
        assert_eq!(b, 2);

        table.remove(a);
        let c = table.add_job(Pid::from_raw(102), true, None);
        assert_eq!(c, 1, "freed slot 1 should be reused before growing");
    }

    #[test]
    fn foreground_slot_is_always_zero() {
        let mut table = JobTable::new();
        let idx = table.add_job(Pid::from_raw(200), false, None);
        assert_eq!(idx, 0);
    }

    #[test]
    fn move_job_vacates_source() {
        let mut table = JobTable::new();
        table.add_job(Pid::from_raw(300), false, None);
        table.move_job(0, 1);
        assert!(!table.is_occupied(0));
        assert!(table.is_occupied(1));
    }

    #[test]
    fn finished_job_removed_on_first_state_query() {
        let mut table = JobTable::new();
        let idx = table.add_job(Pid::from_raw(400), true, None);
        table.add_process(idx, Pid::from_raw(400), &["sleep".to_string()]);
        table.job_mut(idx).unwrap().processes_mut()[0].set_finished(0);

        let (state, code) = table.state_of(idx).unwrap();
        assert_eq!(state, JobState::Finished);
        assert_eq!(code, Some(0));
        assert!(!table.is_occupied(idx));
        assert!(table.state_of(idx).is_none());
    }
}
