//! Root process exit
//!
//! The root exiting ends the host process, so the default hook is checked
//! in a forked test process and a recording hook is checked in-process.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use nexa_emu::syscalls::sys_exit;
    use nexa_emu::{EmulatorConfig, Kernel, Step, Task};
    use rusty_fork::{rusty_fork_id, rusty_fork_test_name};

    use crate::harness::init_logging;

    static SHUTDOWN_CODE: AtomicI32 = AtomicI32::new(-1);

    fn record_and_park(code: i32) -> ! {
        SHUTDOWN_CODE.store(code, Ordering::SeqCst);
        loop {
            thread::park();
        }
    }

    #[test]
    fn test_root_exit_ends_host_process() {
        rusty_fork::fork(
            rusty_fork_test_name!(test_root_exit_ends_host_process),
            rusty_fork_id!(),
            |_| {},
            |child, _| {
                let status = child.wait().expect("wait for forked test");
                assert_eq!(status.code(), Some(7));
            },
            || {
                init_logging();
                let kernel = Kernel::new(EmulatorConfig::default());
                let root = kernel
                    .boot(|task: &mut Task| {
                        sys_exit(task, 7);
                        Step::Continue
                    })
                    .expect("boot");
                root.join();
                unreachable!("root exit must end the process");
            },
        )
        .expect("fork test");
    }

    #[test]
    fn test_root_exit_reaches_shutdown_hook() {
        init_logging();
        let kernel = Kernel::builder(EmulatorConfig::default())
            .shutdown(record_and_park)
            .build();

        // the root's thread stays parked inside the hook
        let _root = kernel
            .boot(|task: &mut Task| {
                let _child = task.fork(|_: &mut Task| Step::Halt).ok();
                sys_exit(task, 0x1_05);
                Step::Continue
            })
            .expect("boot");

        let deadline = Instant::now() + Duration::from_secs(5);
        while SHUTDOWN_CODE.load(Ordering::SeqCst) < 0 {
            assert!(Instant::now() < deadline, "shutdown hook never ran");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(SHUTDOWN_CODE.load(Ordering::SeqCst), 5);
        // the root never becomes a zombie
        let root = kernel.table().lookup(kernel.init_pid()).unwrap();
        assert!(!root.is_zombie());
    }
}
