//! Exit / wait ordering
//!
//! A parent blocked in wait4(-1) must come back with whichever child exits
//! first, and each later wait picks up the next zombie.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::mpsc;
    use std::thread;

    use nexa_emu::posix::{errno, wexitstatus, wifexited, P_ANY};
    use nexa_emu::syscalls::{sys_wait4, sys_waitpid};
    use serial_test::serial;

    use crate::harness::*;

    // =========================================================================
    // Blocking wait scenarios
    // =========================================================================

    #[test]
    #[serial]
    fn test_wait_any_returns_first_exiter() {
        let (kernel, mut parent) = boot_attached();

        let (c1_exit, c1_prog) = exit_on_signal();
        let (c2_exit, c2_prog) = exit_on_signal();
        let c1 = parent.fork(c1_prog).unwrap();
        let c2 = parent.fork(c2_prog).unwrap();
        assert!(c1 < c2);
        assert_eq!(parent.record().children(), vec![c1, c2]);

        let trigger = thread::spawn(move || {
            thread::sleep(SETTLE);
            c2_exit.send(5).unwrap();
        });
        let reaped = sys_wait4(&mut parent, P_ANY as u32, STATUS_ADDR, 0, 0);
        trigger.join().unwrap();

        assert_eq!(reaped, c2 as i32);
        let status = read_status(&kernel);
        assert!(wifexited(status));
        assert_eq!(wexitstatus(status), 5);

        let trigger = thread::spawn(move || {
            thread::sleep(SETTLE);
            c1_exit.send(0).unwrap();
        });
        let reaped = sys_wait4(&mut parent, P_ANY as u32, STATUS_ADDR, 0, 0);
        trigger.join().unwrap();

        assert_eq!(reaped, c1 as i32);
        assert_eq!(wexitstatus(read_status(&kernel)), 0);
        assert!(parent.record().children().is_empty());
    }

    #[test]
    #[serial]
    fn test_wait_any_prefers_creation_order() {
        let (kernel, mut parent) = boot_attached();

        let first = parent.fork(exit_now(1)).unwrap();
        let second = parent.fork(exit_now(2)).unwrap();
        // both zombies before the first wait
        while !kernel.table().lookup(first).unwrap().is_zombie()
            || !kernel.table().lookup(second).unwrap().is_zombie()
        {
            thread::yield_now();
        }

        assert_eq!(sys_wait4(&mut parent, P_ANY as u32, STATUS_ADDR, 0, 0), first as i32);
        assert_eq!(wexitstatus(read_status(&kernel)), 1);
        assert_eq!(sys_wait4(&mut parent, P_ANY as u32, STATUS_ADDR, 0, 0), second as i32);
        assert_eq!(wexitstatus(read_status(&kernel)), 2);
    }

    #[test]
    #[serial]
    fn test_wait_specific_ignores_other_zombies() {
        let (kernel, mut parent) = boot_attached();

        let early = parent.fork(exit_now(3)).unwrap();
        let (late_exit, late_prog) = exit_on_signal();
        let late = parent.fork(late_prog).unwrap();

        let trigger = thread::spawn(move || {
            thread::sleep(SETTLE);
            late_exit.send(4).unwrap();
        });
        assert_eq!(sys_waitpid(&mut parent, late, STATUS_ADDR, 0), late as i32);
        trigger.join().unwrap();
        assert_eq!(wexitstatus(read_status(&kernel)), 4);

        // the early child is still waiting to be collected
        assert!(kernel.table().lookup(early).unwrap().is_zombie());
        assert_eq!(sys_waitpid(&mut parent, early, STATUS_ADDR, 0), early as i32);
        assert_eq!(wexitstatus(read_status(&kernel)), 3);
    }

    #[test]
    #[serial]
    fn test_exit_code_truncated_to_low_byte() {
        let (kernel, mut parent) = boot_attached();
        let child = parent.fork(exit_now(0x1_2c)).unwrap();
        assert_eq!(sys_waitpid(&mut parent, child, STATUS_ADDR, 0), child as i32);
        assert_eq!(wexitstatus(read_status(&kernel)), 0x2c);
    }

    #[test]
    #[serial]
    fn test_halt_without_exit_reports_zero() {
        let (kernel, mut parent) = boot_attached();
        let child = parent
            .fork(|_: &mut nexa_emu::Task| nexa_emu::Step::Halt)
            .unwrap();
        assert_eq!(sys_waitpid(&mut parent, child, STATUS_ADDR, 0), child as i32);
        assert_eq!(read_status(&kernel), 0);
    }

    // =========================================================================
    // Immediate failures
    // =========================================================================

    #[test]
    #[serial]
    fn test_wait_any_without_children() {
        let (_kernel, mut parent) = boot_attached();
        assert_eq!(
            sys_wait4(&mut parent, P_ANY as u32, STATUS_ADDR, 0, 0),
            -errno::ESRCH
        );
    }

    #[test]
    #[serial]
    fn test_wait_for_unknown_pid() {
        let (_kernel, mut parent) = boot_attached();
        let _child = parent.fork(exit_now(0)).unwrap();
        assert_eq!(sys_waitpid(&mut parent, 4000, STATUS_ADDR, 0), -errno::ECHILD);
        assert_eq!(sys_waitpid(&mut parent, 0, STATUS_ADDR, 0), -errno::ECHILD);
    }

    #[test]
    #[serial]
    fn test_wait_for_grandchild_is_rejected() {
        let (kernel, mut parent) = boot_attached();
        let (pid_tx, pid_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let child = parent
            .fork(move |task: &mut nexa_emu::Task| {
                let grandchild = task.fork(exit_now(0)).unwrap();
                pid_tx.send(grandchild).unwrap();
                let _ = release_rx.recv();
                nexa_emu::syscalls::sys_waitpid(task, grandchild, 0, 0);
                nexa_emu::syscalls::sys_exit(task, 0);
                nexa_emu::Step::Continue
            })
            .unwrap();

        let grandchild = pid_rx.recv().unwrap();
        assert_eq!(
            kernel.table().lookup(grandchild).unwrap().parent(),
            Some(child)
        );
        assert_eq!(
            sys_waitpid(&mut parent, grandchild, STATUS_ADDR, 0),
            -errno::ECHILD
        );

        release_tx.send(()).unwrap();
        assert_eq!(sys_waitpid(&mut parent, child, STATUS_ADDR, 0), child as i32);
        assert!(!kernel.table().contains(grandchild));
    }

    #[test]
    #[serial]
    fn test_reused_parent_pid_does_not_inherit_grandchild() {
        let (kernel, mut root) = boot_attached();
        let (handoff_tx, handoff_rx) = mpsc::channel();

        let middle = root
            .fork(move |task: &mut nexa_emu::Task| {
                let (exit_tx, program) = exit_on_signal();
                let grandchild = task.fork(program).unwrap();
                handoff_tx.send((grandchild, exit_tx)).unwrap();
                nexa_emu::syscalls::sys_exit(task, 0);
                nexa_emu::Step::Continue
            })
            .unwrap();
        let (grandchild, grandchild_exit) = handoff_rx.recv().unwrap();

        assert_eq!(sys_waitpid(&mut root, middle, STATUS_ADDR, 0), middle as i32);

        // the next process created takes over the freed PID
        let reuser = kernel.table().create_child(root.record()).unwrap();
        assert_eq!(reuser.pid(), middle);
        let mut reuser = nexa_emu::Task::attach(kernel.clone(), reuser);

        grandchild_exit.send(2).unwrap();
        let record = kernel.table().lookup(grandchild).unwrap();
        while !record.is_zombie() {
            thread::yield_now();
        }

        assert_eq!(
            sys_waitpid(&mut reuser, grandchild, STATUS_ADDR, 0),
            -errno::ECHILD
        );
        assert_eq!(
            sys_wait4(&mut reuser, P_ANY as u32, STATUS_ADDR, 0, 0),
            -errno::ESRCH
        );
        assert!(kernel.table().contains(grandchild));
    }

    // =========================================================================
    // Many children
    // =========================================================================

    #[test]
    #[serial]
    fn test_reap_many_concurrent_exits() {
        const CHILDREN: u32 = 32;
        let (kernel, mut parent) = boot_attached();

        let mut expected = BTreeSet::new();
        for code in 0..CHILDREN {
            let pid = parent.fork(exit_now(code)).unwrap();
            expected.insert((pid, code as i32));
        }

        let mut seen = BTreeSet::new();
        for _ in 0..CHILDREN {
            let pid = sys_wait4(&mut parent, P_ANY as u32, STATUS_ADDR, 0, 0);
            assert!(pid > 0, "wait4 failed with {}", pid);
            seen.insert((pid as u32, wexitstatus(read_status(&kernel))));
        }

        assert_eq!(seen, expected);
        assert_eq!(
            sys_wait4(&mut parent, P_ANY as u32, STATUS_ADDR, 0, 0),
            -errno::ESRCH
        );
        assert_eq!(kernel.table().len(), 1);
    }
}
