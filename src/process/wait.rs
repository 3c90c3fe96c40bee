//! Child reaping (wait4)
//!
//! The whole search/collect/destroy sequence runs under the caller's own
//! record lock. When nothing matches, the caller sleeps on its
//! `child_exit` channel, which releases the lock atomically, and rescans
//! after every wakeup.

use parking_lot::MutexGuard;

use super::types::{Pid, ProcessRecord, RecordState};
use crate::kernel::Kernel;
use crate::memory::{user_put, GuestAddr, GuestMemory, MemoryFault, Rusage};
use crate::posix::errno;
use crate::{kdebug, kinfo, ktrace};

/// Which children a wait call accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitSelector {
    Any,
    Pid(Pid),
}

/// Wait failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("no children to wait for")]
    NoChildren,

    #[error("process {0} is not a child of the caller")]
    NoSuchChild(Pid),

    #[error("bad status destination: {0}")]
    BadAddress(#[from] MemoryFault),
}

impl WaitError {
    /// Guest errno for this error.
    ///
    /// A wildcard wait with no children reports `ESRCH`, not `ECHILD`;
    /// guest programs built against this emulator see that code.
    pub fn errno(&self) -> i32 {
        match self {
            WaitError::NoChildren => errno::ESRCH,
            WaitError::NoSuchChild(_) => errno::ECHILD,
            WaitError::BadAddress(_) => errno::EFAULT,
        }
    }
}

/// Where the reaped child's data goes. `None` means "not requested".
#[derive(Clone, Copy)]
pub struct WaitTargets<'a> {
    pub memory: &'a dyn GuestMemory,
    pub status: Option<GuestAddr>,
    pub rusage: Option<GuestAddr>,
}

impl<'a> WaitTargets<'a> {
    pub fn new(memory: &'a dyn GuestMemory) -> Self {
        Self {
            memory,
            status: None,
            rusage: None,
        }
    }

    pub fn status(mut self, addr: Option<GuestAddr>) -> Self {
        self.status = addr;
        self
    }

    pub fn rusage(mut self, addr: Option<GuestAddr>) -> Self {
        self.rusage = addr;
        self
    }
}

/// Wait for a child of `caller` matching `selector` to become a zombie,
/// report it through `targets` and destroy it. Returns the child's PID.
///
/// Blocks until a match exists. Never blocks when failing with
/// `NoChildren` or `NoSuchChild`.
pub fn wait_child(
    kernel: &Kernel,
    caller: &ProcessRecord,
    selector: WaitSelector,
    targets: WaitTargets<'_>,
) -> Result<Pid, WaitError> {
    let mut state = caller.lock();

    if selector == WaitSelector::Any && state.children.is_empty() {
        kdebug!("wait4: process {} has no children", caller.pid());
        return Err(WaitError::NoChildren);
    }

    loop {
        if let Some(zombie) = find_zombie(kernel, caller, &state, selector)? {
            return reap(kernel, caller, &mut state, &zombie, targets);
        }

        ktrace!("wait4: process {} sleeping on child_exit", caller.pid());
        caller.wait_child_exit(&mut state);
        ktrace!("wait4: process {} woke up, rescanning", caller.pid());
    }
}

/// `waitpid`: `wait_child` without resource usage.
pub fn waitpid(
    kernel: &Kernel,
    caller: &ProcessRecord,
    selector: WaitSelector,
    memory: &dyn GuestMemory,
    status: Option<GuestAddr>,
) -> Result<Pid, WaitError> {
    wait_child(
        kernel,
        caller,
        selector,
        WaitTargets::new(memory).status(status),
    )
}

/// One selection pass. `Ok(None)` means "no zombie yet, keep waiting".
fn find_zombie(
    kernel: &Kernel,
    caller: &ProcessRecord,
    state: &RecordState,
    selector: WaitSelector,
) -> Result<Option<std::sync::Arc<ProcessRecord>>, WaitError> {
    match selector {
        WaitSelector::Any => Ok(state
            .children
            .iter()
            .filter_map(|&pid| kernel.table().lookup(pid))
            .find(|child| child.is_zombie())),
        WaitSelector::Pid(pid) => {
            // Membership in the caller's own list decides; a stale parent
            // PID on the record may belong to an earlier process.
            let child = state
                .children
                .contains(&pid)
                .then(|| kernel.table().lookup(pid))
                .flatten();
            match child {
                Some(child) => Ok(child.is_zombie().then_some(child)),
                None => {
                    kdebug!("wait4: {} is not a child of {}", pid, caller.pid());
                    Err(WaitError::NoSuchChild(pid))
                }
            }
        }
    }
}

/// Copy out the zombie's status and destroy it. On a fault the zombie is
/// left untouched so a later wait can collect it.
fn reap(
    kernel: &Kernel,
    caller: &ProcessRecord,
    state: &mut MutexGuard<'_, RecordState>,
    zombie: &ProcessRecord,
    targets: WaitTargets<'_>,
) -> Result<Pid, WaitError> {
    let pid = zombie.pid();
    let status = zombie.exit_status().unwrap_or(0);

    if let Some(addr) = targets.status {
        user_put(targets.memory, addr, &status).map_err(|fault| {
            kdebug!("wait4: status write for {} faulted: {}", pid, fault);
            WaitError::BadAddress(fault)
        })?;
    }
    if let Some(addr) = targets.rusage {
        user_put(targets.memory, addr, &Rusage::default()).map_err(|fault| {
            kdebug!("wait4: rusage write for {} faulted: {}", pid, fault);
            WaitError::BadAddress(fault)
        })?;
    }

    kernel.table().destroy(pid);
    state.children.retain(|&child| child != pid);
    kinfo!(
        "wait4: process {} reaped child {} (status {:#x})",
        caller.pid(),
        pid,
        status
    );
    Ok(pid)
}
