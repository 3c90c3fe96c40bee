//! Emulated kernel instance
//!
//! Ties together the configuration, the process table, guest memory and
//! the host shutdown hook. Every guest thread holds an `Arc<Kernel>`.

use std::sync::Arc;

use crate::config::EmulatorConfig;
use crate::memory::{FlatMemory, GuestAddr, GuestMemory};
use crate::process::execution::{spawn_init, GuestProgram, GuestThread};
use crate::process::table::{ProcessTable, SpawnError};
use crate::process::types::Pid;

/// Base of the default guest memory window
pub const DEFAULT_GUEST_BASE: GuestAddr = 0x0040_0000;
/// Size of the default guest memory window (1 MiB)
pub const DEFAULT_GUEST_SIZE: usize = 1024 * 1024;

pub struct Kernel {
    config: EmulatorConfig,
    table: ProcessTable,
    memory: Arc<dyn GuestMemory>,
    shutdown: fn(i32) -> !,
}

pub struct KernelBuilder {
    config: EmulatorConfig,
    memory: Option<Arc<dyn GuestMemory>>,
    shutdown: fn(i32) -> !,
}

impl KernelBuilder {
    pub fn memory(mut self, memory: Arc<dyn GuestMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Replace the host shutdown hook (defaults to `std::process::exit`).
    pub fn shutdown(mut self, hook: fn(i32) -> !) -> Self {
        self.shutdown = hook;
        self
    }

    pub fn build(self) -> Arc<Kernel> {
        let memory = self.memory.unwrap_or_else(|| {
            Arc::new(FlatMemory::new(DEFAULT_GUEST_BASE, DEFAULT_GUEST_SIZE))
        });
        Arc::new(Kernel {
            table: ProcessTable::new(self.config.max_pid),
            config: self.config,
            memory,
            shutdown: self.shutdown,
        })
    }
}

impl Kernel {
    pub fn builder(config: EmulatorConfig) -> KernelBuilder {
        KernelBuilder {
            config,
            memory: None,
            shutdown: std::process::exit,
        }
    }

    /// Kernel with the default memory window and shutdown hook
    pub fn new(config: EmulatorConfig) -> Arc<Kernel> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn memory(&self) -> &dyn GuestMemory {
        self.memory.as_ref()
    }

    #[inline]
    pub fn init_pid(&self) -> Pid {
        self.config.init_pid
    }

    /// Register the root process and start running `program` on its thread.
    pub fn boot<P: GuestProgram>(self: &Arc<Self>, program: P) -> Result<GuestThread, SpawnError> {
        spawn_init(self, program)
    }

    /// Stop the whole emulated environment with host exit status `code`.
    pub fn shutdown(&self, code: i32) -> ! {
        log::logger().flush();
        (self.shutdown)(code)
    }
}
