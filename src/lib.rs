//! Process lifetime core for a user-mode emulator
//!
//! Guest processes run as host threads. This crate implements how they
//! end (`exit`, `exit_group`) and how parents collect them (`wait4`,
//! `waitpid`), plus the process table, guest memory access and the
//! execution units needed to drive them.

pub mod config;
pub mod kernel;
pub mod logger;
pub mod memory;
pub mod posix;
pub mod process;
pub mod syscalls;

pub use config::{ConfigError, EmulatorConfig, LoggingConfig};
pub use kernel::{Kernel, KernelBuilder};
pub use process::{GuestProgram, GuestThread, Pid, Step, Task};

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::logger::log($level, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kfatal {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::FATAL, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::ERROR, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::WARN, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::INFO, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::DEBUG, $($arg)*);
    }};
}

#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::TRACE, $($arg)*);
    }};
}
