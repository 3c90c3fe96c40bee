//! Process management subsystem
//!
//! Guest processes, their lifetime, and the parent/child reaping protocol.
//!
//! ## Module Organization
//!
//! - `types`: `Pid` and the per-process `ProcessRecord`
//! - `pid_alloc`: Bitmap PID allocator
//! - `table`: The process table owning every live record
//! - `exit`: Termination (running -> zombie)
//! - `wait`: Waiting for and reaping zombie children
//! - `execution`: Host-thread execution units and the guest run loop
//!
//! ## Locking
//!
//! Each record has one lock guarding its children list; a record's zombie
//! flag is set under its parent's lock. A thread holds at most one record
//! lock at a time and may take the table lock while holding it, never the
//! other way round.

pub mod execution;
pub mod exit;
pub mod pid_alloc;
pub mod table;
pub mod types;
pub mod wait;

pub use execution::{spawn_init, GuestProgram, GuestThread, RunState, Step, Task};
pub use exit::terminate;
pub use pid_alloc::{PidAllocator, MAX_PID, MIN_PID};
pub use table::{ProcessTable, SpawnError};
pub use types::{Pid, ProcessRecord, RecordState};
pub use wait::{wait_child, waitpid, WaitError, WaitSelector, WaitTargets};
