//! Syscall subsystem
//!
//! Guest-facing entry points. Arguments arrive as raw 32-bit register
//! values; results are a non-negative value on success or a negated errno.
//!
//! - `numbers`: Syscall number constants
//! - `process`: exit, exit_group, wait4, waitpid

use crate::kwarn;
use crate::posix::errno;
use crate::process::Task;

pub mod numbers;
mod process;

pub use numbers::*;
pub use process::{sys_exit, sys_exit_group, sys_wait4, sys_waitpid};

/// Raw syscall arguments in register order (ebx, ecx, edx, esi, edi, ebp)
pub type SyscallArgs = [u32; 6];

/// Main syscall dispatcher
pub fn dispatch(task: &mut Task, nr: u32, args: SyscallArgs) -> i32 {
    let [arg1, arg2, arg3, arg4, _, _] = args;

    match nr {
        SYS_EXIT => {
            sys_exit(task, arg1);
            0
        }
        SYS_EXIT_GROUP => {
            sys_exit_group(task, arg1);
            0
        }
        SYS_WAITPID => sys_waitpid(task, arg1, arg2, arg3),
        SYS_WAIT4 => sys_wait4(task, arg1, arg2, arg3, arg4),
        _ => {
            kwarn!("Unknown syscall: {} from process {}", nr, task.pid());
            -errno::ENOSYS
        }
    }
}
