//! System call numbers
//!
//! The guest ABI is i386 Linux, so these follow `arch/x86/entry/syscalls/syscall_32.tbl`.

// Process termination
pub const SYS_EXIT: u32 = 1;
pub const SYS_EXIT_GROUP: u32 = 252;

// Child reaping
pub const SYS_WAITPID: u32 = 7;
pub const SYS_WAIT4: u32 = 114;
