//! Process termination
//!
//! Moves a process from running to zombie and wakes whoever is waiting on
//! it: the parent on its `child_exit` channel, a vfork creator on the
//! process's own `vfork_done` channel.

use super::types::ProcessRecord;
use crate::kernel::Kernel;
use crate::{kdebug, kinfo, kwarn};

/// Terminate `process` with the raw wait-status word `raw_status`.
///
/// Must be called at most once per process, from the thread running it.
/// For the root process this shuts the whole emulator down and does not
/// return. Otherwise the record becomes a zombie and the caller is
/// expected to stop running guest code.
///
/// The parent's lock and the process's own lock are taken one after the
/// other, never together.
pub fn terminate(kernel: &Kernel, process: &ProcessRecord, raw_status: i32) {
    let pid = process.pid();

    if pid == kernel.init_pid() {
        let code = raw_status >> 8;
        kinfo!("exit: root process {} exited, shutting down with status {}", pid, code);
        kernel.shutdown(code);
    }

    kinfo!("exit: process {} exiting with status {:#x}", pid, raw_status);

    // The parent link is a PID; it only counts while the parent still
    // lists this process, since a reaped parent's PID can be reused.
    let parent = process.parent().and_then(|ppid| kernel.table().lookup(ppid));
    let reported = match parent {
        Some(parent) => {
            let state = parent.lock();
            if state.children.contains(&pid) {
                if process.mark_zombie(raw_status) {
                    kdebug!("exit: process {} is now a zombie of {}", pid, parent.pid());
                } else {
                    kwarn!("exit: process {} exited twice, keeping first status", pid);
                }
                parent.notify_child_exit();
                true
            } else {
                false
            }
        }
        None => false,
    };

    if !reported {
        // Orphan adoption is not handled here; the zombie is still
        // recorded so a late observer sees a consistent state.
        kwarn!("exit: process {} has no live parent", pid);
        let _guard = process.lock();
        process.mark_zombie(raw_status);
    }

    let mut state = process.lock();
    state.vfork_released = true;
    process.notify_vfork_done();
}
