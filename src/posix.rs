//! Guest ABI constants: errno values and the wait-status word.

use bitflags::bitflags;

/// POSIX style error numbers (subset used by the process lifecycle).
pub mod errno {
    pub const ESRCH: i32 = 3; // No such process
    pub const ECHILD: i32 = 10; // No child processes
    pub const EFAULT: i32 = 14; // Bad address
    pub const ENOSYS: i32 = 38; // Function not implemented
}

/// `pid` argument of wait4/waitpid meaning "any child".
pub const P_ANY: i32 = -1;

bitflags! {
    /// `options` argument of wait4/waitpid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WaitOptions: u32 {
        const WNOHANG = 0x1;
        const WUNTRACED = 0x2;
        const WEXITED = 0x4;
        const WCONTINUED = 0x8;
        const WNOWAIT = 0x0100_0000;
        const WNOTHREAD = 0x2000_0000;
        const WALL = 0x4000_0000;
        const WCLONE = 0x8000_0000;
    }
}

/// Wait-status word for a normal exit: code in bits 8..15.
#[inline]
pub const fn w_exitcode(code: i32) -> i32 {
    code << 8
}

/// Exit code stored in a wait-status word.
#[inline]
pub const fn wexitstatus(status: i32) -> i32 {
    (status >> 8) & 0xff
}

/// True when the status word describes a normal exit (no terminating signal).
#[inline]
pub const fn wifexited(status: i32) -> bool {
    status & 0x7f == 0
}
