//! vfork completion

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    use nexa_emu::posix::wexitstatus;
    use nexa_emu::syscalls::{sys_exit, sys_waitpid};
    use nexa_emu::{Step, Task};
    use serial_test::serial;

    use crate::harness::*;

    #[test]
    #[serial]
    fn test_vfork_blocks_until_child_exits() {
        let (kernel, mut parent) = boot_attached();
        let child_ran = Arc::new(AtomicBool::new(false));

        let flag = child_ran.clone();
        let child = parent
            .vfork(move |task: &mut Task| {
                thread::sleep(SETTLE);
                flag.store(true, Ordering::SeqCst);
                sys_exit(task, 21);
                Step::Continue
            })
            .unwrap();

        assert!(child_ran.load(Ordering::SeqCst));
        let record = kernel.table().lookup(child).unwrap();
        assert!(record.is_zombie());

        assert_eq!(sys_waitpid(&mut parent, child, STATUS_ADDR, 0), child as i32);
        assert_eq!(wexitstatus(read_status(&kernel)), 21);
    }

    #[test]
    #[serial]
    fn test_vfork_child_that_halts() {
        let (kernel, mut parent) = boot_attached();
        let child = parent.vfork(|_: &mut Task| Step::Halt).unwrap();

        assert!(kernel.table().lookup(child).unwrap().is_zombie());
        assert_eq!(sys_waitpid(&mut parent, child, STATUS_ADDR, 0), child as i32);
        assert_eq!(read_status(&kernel), 0);
    }
}
