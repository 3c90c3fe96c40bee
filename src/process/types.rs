//! Process record definitions
//!
//! A `ProcessRecord` is the lifecycle state of one guest process. Records
//! are owned by the process table and reference each other only by PID.

use std::sync::OnceLock;

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Process ID type (guest dword)
pub type Pid = u32;

/// State guarded by a record's lock
#[derive(Debug, Default)]
pub struct RecordState {
    /// Children in creation order
    pub children: Vec<Pid>,
    /// Set once this record has finished exit processing; a vfork parent
    /// blocks on `vfork_done` until it sees this.
    pub vfork_released: bool,
}

/// Lifecycle record of one guest process
///
/// Lock discipline: at most one record lock is held by any thread at a
/// time. The table's internal lock may be taken while holding a record
/// lock, never the other way round.
pub struct ProcessRecord {
    pid: Pid,
    /// `None` only for the root process
    parent: Option<Pid>,
    state: Mutex<RecordState>,
    /// Raw wait-status word. Written once, while holding the *parent's*
    /// lock, at the zombie transition.
    exit_status: OnceLock<i32>,
    /// Broadcast when one of this record's children becomes a zombie
    child_exit: Condvar,
    /// Broadcast when this record finishes exit processing
    vfork_done: Condvar,
}

impl ProcessRecord {
    pub fn new(pid: Pid, parent: Option<Pid>) -> Self {
        Self {
            pid,
            parent,
            state: Mutex::new(RecordState::default()),
            exit_status: OnceLock::new(),
            child_exit: Condvar::new(),
            vfork_done: Condvar::new(),
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    pub fn lock(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock()
    }

    pub fn is_zombie(&self) -> bool {
        self.exit_status.get().is_some()
    }

    /// Raw wait-status word, once the record is a zombie
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status.get().copied()
    }

    /// The zombie transition. Returns false if the record already exited.
    ///
    /// Callers must hold the parent's lock so the transition is ordered
    /// against the parent's wait scan.
    pub(crate) fn mark_zombie(&self, raw_status: i32) -> bool {
        self.exit_status.set(raw_status).is_ok()
    }

    pub(crate) fn notify_child_exit(&self) {
        self.child_exit.notify_all();
    }

    /// Atomically release `guard` and sleep until a child exits.
    pub(crate) fn wait_child_exit(&self, guard: &mut MutexGuard<'_, RecordState>) {
        self.child_exit.wait(guard);
    }

    pub(crate) fn notify_vfork_done(&self) {
        self.vfork_done.notify_all();
    }

    /// Block until this record has finished exit processing.
    pub fn wait_vfork_done(&self) {
        let mut state = self.state.lock();
        while !state.vfork_released {
            self.vfork_done.wait(&mut state);
        }
    }

    /// Snapshot of the children list
    pub fn children(&self) -> Vec<Pid> {
        self.state.lock().children.clone()
    }
}

impl core::fmt::Debug for ProcessRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessRecord")
            .field("pid", &self.pid)
            .field("parent", &self.parent)
            .field("exit_status", &self.exit_status.get())
            .finish_non_exhaustive()
    }
}
