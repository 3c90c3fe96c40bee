//! Syscall ABI tests
