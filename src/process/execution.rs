//! Guest execution units
//!
//! Every guest process runs on its own host thread. The thread drives a
//! `GuestProgram` one step at a time until the process has exited; once
//! the task reaches `RunState::Exited` the loop stops and the host thread
//! ends, so process lifetime and thread lifetime coincide.

use std::sync::Arc;
use std::thread::JoinHandle;

use super::exit::terminate;
use super::table::SpawnError;
use super::types::{Pid, ProcessRecord};
use crate::kernel::Kernel;
use crate::posix::w_exitcode;
use crate::{kdebug, ktrace, kwarn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Exited,
}

/// Result of one program step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The program has nothing left to run. If it did not exit on its own
    /// the run loop exits it with status 0.
    Halt,
}

pub trait GuestProgram: Send + 'static {
    fn step(&mut self, task: &mut Task) -> Step;
}

impl<F> GuestProgram for F
where
    F: FnMut(&mut Task) -> Step + Send + 'static,
{
    fn step(&mut self, task: &mut Task) -> Step {
        self(task)
    }
}

/// Per-process execution context, owned by the process's host thread
pub struct Task {
    kernel: Arc<Kernel>,
    record: Arc<ProcessRecord>,
    state: RunState,
}

impl Task {
    /// Drive `record` from the calling thread instead of a spawned one.
    ///
    /// The caller must be the only thread acting as this process.
    pub fn attach(kernel: Arc<Kernel>, record: Arc<ProcessRecord>) -> Self {
        Self {
            kernel,
            record,
            state: RunState::Running,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.record.pid()
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    pub fn record(&self) -> &Arc<ProcessRecord> {
        &self.record
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn has_exited(&self) -> bool {
        self.state == RunState::Exited
    }

    /// Terminate this process with a raw wait-status word. After this the
    /// run loop executes no further steps.
    pub fn do_exit(&mut self, raw_status: i32) {
        if self.has_exited() {
            kwarn!("process {} tried to exit twice", self.pid());
            return;
        }
        terminate(&self.kernel, &self.record, raw_status);
        self.state = RunState::Exited;
    }

    /// Create a child process running `program` on a new host thread.
    pub fn fork<P: GuestProgram>(&mut self, program: P) -> Result<Pid, SpawnError> {
        let child = self.kernel.table().create_child(&self.record)?;
        let pid = child.pid();
        spawn_unit(&self.kernel, child, Some(&self.record), program)?;
        Ok(pid)
    }

    /// Like `fork`, but blocks until the child has finished exit processing.
    pub fn vfork<P: GuestProgram>(&mut self, program: P) -> Result<Pid, SpawnError> {
        let child = self.kernel.table().create_child(&self.record)?;
        let pid = child.pid();
        spawn_unit(&self.kernel, child.clone(), Some(&self.record), program)?;
        ktrace!("vfork: process {} waiting for child {}", self.pid(), pid);
        child.wait_vfork_done();
        Ok(pid)
    }
}

/// Handle to a guest process's host thread
pub struct GuestThread {
    pid: Pid,
    handle: JoinHandle<()>,
}

impl GuestThread {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Wait for the host thread to end. Returns false if it panicked.
    pub fn join(self) -> bool {
        self.handle.join().is_ok()
    }
}

/// Register the root process and start its thread.
pub fn spawn_init<P: GuestProgram>(
    kernel: &Arc<Kernel>,
    program: P,
) -> Result<GuestThread, SpawnError> {
    let record = kernel.table().create_init(kernel.init_pid())?;
    spawn_unit(kernel, record, None, program)
}

fn spawn_unit<P: GuestProgram>(
    kernel: &Arc<Kernel>,
    record: Arc<ProcessRecord>,
    parent: Option<&Arc<ProcessRecord>>,
    program: P,
) -> Result<GuestThread, SpawnError> {
    let pid = record.pid();
    let config = kernel.config();
    let task = Task::attach(kernel.clone(), record);

    let spawned = std::thread::Builder::new()
        .name(format!("{}-{}", config.thread_name_prefix, pid))
        .stack_size(config.thread_stack_size)
        .spawn(move || run(task, program));

    match spawned {
        Ok(handle) => Ok(GuestThread { pid, handle }),
        Err(err) => {
            // The process never ran; undo its registration.
            kernel.table().destroy(pid);
            if let Some(parent) = parent {
                parent.lock().children.retain(|&child| child != pid);
            }
            Err(SpawnError::Thread(err))
        }
    }
}

fn run<P: GuestProgram>(mut task: Task, mut program: P) {
    kdebug!("process {} started", task.pid());
    while !task.has_exited() {
        if program.step(&mut task) == Step::Halt && !task.has_exited() {
            kdebug!("process {} halted without exit", task.pid());
            task.do_exit(w_exitcode(0));
        }
    }
    ktrace!("process {} execution unit finished", task.pid());
}
