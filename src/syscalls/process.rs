//! Process management related syscalls
//!
//! Implements: exit, exit_group, wait4, waitpid

use crate::memory::GuestAddr;
use crate::posix::{w_exitcode, WaitOptions, P_ANY};
use crate::process::wait::{wait_child, WaitSelector, WaitTargets};
use crate::process::Task;
use crate::{kdebug, ktrace};

/// Exit system call - terminate the calling process
///
/// Only the low 8 bits of `status` survive into the wait-status word.
/// Once this returns the task is marked exited and its run loop stops.
pub fn sys_exit(task: &mut Task, status: u32) {
    ktrace!("[SYS_EXIT] process {} status {}", task.pid(), status);
    // Linux keeps only the low byte before shifting: exit(300) reports 0x2c00.
    task.do_exit(w_exitcode((status & 0xff) as i32));
}

/// Every guest process has exactly one thread, so this is `exit`.
pub fn sys_exit_group(task: &mut Task, status: u32) {
    ktrace!("[SYS_EXIT_GROUP] process {} status {}", task.pid(), status);
    sys_exit(task, status);
}

/// POSIX wait4() system call - wait for a child to terminate and reap it
///
/// `pid` is -1 for any child or a specific child PID. A zero address means
/// the caller does not want that result written.
pub fn sys_wait4(task: &mut Task, pid: u32, status: u32, options: u32, rusage: u32) -> i32 {
    log_unsupported_options(task, options);

    let selector = selector_from_raw(pid);

    let kernel = task.kernel().clone();
    let targets = WaitTargets::new(kernel.memory())
        .status(guest_ptr(status))
        .rusage(guest_ptr(rusage));

    match wait_child(&kernel, task.record(), selector, targets) {
        Ok(reaped) => reaped as i32,
        Err(err) => {
            kdebug!("wait4: process {} failed: {}", task.pid(), err);
            -err.errno()
        }
    }
}

/// POSIX waitpid() - `wait4` without resource usage
pub fn sys_waitpid(task: &mut Task, pid: u32, status: u32, options: u32) -> i32 {
    sys_wait4(task, pid, status, options, 0)
}

/// Process groups are not modelled: 0 and other negative values name no
/// child and fail the lookup.
fn selector_from_raw(pid: u32) -> WaitSelector {
    if pid as i32 == P_ANY {
        WaitSelector::Any
    } else {
        WaitSelector::Pid(pid)
    }
}

fn guest_ptr(addr: u32) -> Option<GuestAddr> {
    (addr != 0).then_some(addr)
}

fn log_unsupported_options(task: &Task, options: u32) {
    let options = WaitOptions::from_bits_retain(options);
    if options.is_empty() {
        return;
    }
    // Waits always block for termination; other option bits have no effect.
    kdebug!(
        "wait4: process {} ignoring options {:?} ({:#x})",
        task.pid(),
        options,
        options.bits()
    );
}
