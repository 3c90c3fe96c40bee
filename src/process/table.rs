//! Process table
//!
//! Owns every live `ProcessRecord`, keyed by PID, together with the PID
//! allocator. Destroying a record is a single removal from this table.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::pid_alloc::PidAllocator;
use super::types::{Pid, ProcessRecord};
use crate::{kdebug, kwarn};

/// Process creation error
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("no free PID left")]
    PidExhausted,

    #[error("parent process {0} not found")]
    ParentNotFound(Pid),

    #[error("root process {0} already exists")]
    InitExists(Pid),

    #[error("failed to start host thread: {0}")]
    Thread(#[from] std::io::Error),
}

pub struct ProcessTable {
    records: RwLock<BTreeMap<Pid, Arc<ProcessRecord>>>,
    pids: Mutex<PidAllocator>,
}

impl ProcessTable {
    pub fn new(max_pid: Pid) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            pids: Mutex::new(PidAllocator::new(max_pid)),
        }
    }

    /// Register the root process under its fixed PID.
    pub fn create_init(&self, pid: Pid) -> Result<Arc<ProcessRecord>, SpawnError> {
        if !self.pids.lock().mark_allocated(pid) {
            return Err(SpawnError::InitExists(pid));
        }
        let record = Arc::new(ProcessRecord::new(pid, None));
        self.records.write().insert(pid, record.clone());
        kdebug!("process table: registered root process {}", pid);
        Ok(record)
    }

    /// Allocate and register a child of `parent`.
    ///
    /// The child is published in the table before it is appended to the
    /// parent's children, so a wait scan never sees a child PID that does
    /// not resolve. The parent lock is taken after the table lock has been
    /// released.
    pub fn create_child(&self, parent: &ProcessRecord) -> Result<Arc<ProcessRecord>, SpawnError> {
        let parent_pid = parent.pid();
        if !self.contains(parent_pid) {
            return Err(SpawnError::ParentNotFound(parent_pid));
        }

        let pid = self
            .pids
            .lock()
            .allocate_next()
            .ok_or(SpawnError::PidExhausted)?;
        let record = Arc::new(ProcessRecord::new(pid, Some(parent_pid)));
        self.records.write().insert(pid, record.clone());

        parent.lock().children.push(pid);
        kdebug!("process table: created child {} of {}", pid, parent_pid);
        Ok(record)
    }

    pub fn lookup(&self, pid: Pid) -> Option<Arc<ProcessRecord>> {
        self.records.read().get(&pid).cloned()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.records.read().contains_key(&pid)
    }

    /// Remove `pid` from the table and recycle the PID.
    ///
    /// Called by the reaper with the parent's lock held; the caller removes
    /// the PID from the parent's children under that same lock.
    pub fn destroy(&self, pid: Pid) -> Option<Arc<ProcessRecord>> {
        let removed = self.records.write().remove(&pid);
        if removed.is_some() {
            if !self.pids.lock().mark_free(pid) {
                kwarn!("process table: PID {} was not marked allocated", pid);
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Registered PIDs in ascending order
    pub fn pids(&self) -> Vec<Pid> {
        self.records.read().keys().copied().collect()
    }
}
