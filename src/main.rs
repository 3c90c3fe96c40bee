//! nexa-emu demo binary
//!
//! Usage: nexa-emu [config.yaml] [log=<level>]
//!
//! Boots a root process that forks `demo_children` workers, reaps them
//! with `wait4(-1)` and exits with the number it reaped. That status
//! becomes the host exit status.

use std::process::ExitCode;

use nexa_emu::kernel::DEFAULT_GUEST_BASE;
use nexa_emu::memory::user_get;
use nexa_emu::posix::{wexitstatus, P_ANY};
use nexa_emu::syscalls::{dispatch, SYS_EXIT, SYS_WAIT4};
use nexa_emu::{kerror, kinfo, logger, EmulatorConfig, Kernel, Step, Task};

fn demo_init(workers: u32) -> impl FnMut(&mut Task) -> Step + Send + 'static {
    // None until the workers have been forked
    let mut reaped: Option<u32> = None;
    move |task: &mut Task| {
        let Some(count) = reaped else {
            for index in 0..workers {
                let forked = task.fork(move |worker: &mut Task| {
                    kinfo!("worker {} (index {}) running", worker.pid(), index);
                    dispatch(worker, SYS_EXIT, [index, 0, 0, 0, 0, 0]);
                    Step::Continue
                });
                if let Err(err) = forked {
                    kerror!("demo: fork failed: {}", err);
                    break;
                }
            }
            reaped = Some(0);
            return Step::Continue;
        };

        let status_addr = DEFAULT_GUEST_BASE;
        let ret = dispatch(task, SYS_WAIT4, [P_ANY as u32, status_addr, 0, 0, 0, 0]);
        if ret < 0 {
            kinfo!("demo: wait4 returned {}, reaped {} workers", ret, count);
            dispatch(task, SYS_EXIT, [count, 0, 0, 0, 0, 0]);
            return Step::Continue;
        }
        match user_get::<i32>(task.kernel().memory(), status_addr) {
            Ok(status) => kinfo!("demo: reaped {} with status {}", ret, wexitstatus(status)),
            Err(err) => kerror!("demo: cannot read status: {}", err),
        }
        reaped = Some(count + 1);
        Step::Continue
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = args.iter().find(|arg| !arg.contains('=')).cloned();

    let mut config = match config_path {
        Some(path) => match EmulatorConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("nexa-emu: {}: {}", path, err);
                return ExitCode::from(1);
            }
        },
        None => EmulatorConfig::default(),
    };

    if let Some(level) = logger::parse_level_directive(&args.join(" ")) {
        config.logging.level = level;
    }
    logger::init(&config.logging);
    kinfo!("Starting nexa-emu v{}", env!("CARGO_PKG_VERSION"));

    let workers = config.demo_children;
    let kernel = Kernel::new(config);
    let init = match kernel.boot(demo_init(workers)) {
        Ok(init) => init,
        Err(err) => {
            kerror!("failed to boot root process: {}", err);
            return ExitCode::from(1);
        }
    };

    // The root process ends the host through the shutdown hook; getting
    // here means its thread died without exiting.
    init.join();
    kerror!("root process thread ended without exit");
    ExitCode::from(1)
}
