use crate::{
    ProcError,
    hal::Platform,
    task::{PStat, ProcessManager},
};

/// Err 一律映射为 -1
fn ret(result: Result<usize, ProcError>) -> isize {
    match result {
        Ok(value) => value as isize,
        Err(err) => {
            debug!("syscall failed: {}", err);
            -1
        }
    }
}

pub fn sys_fork<P: Platform>(pm: &ProcessManager<P>) -> isize {
    ret(pm.fork())
}

pub fn sys_exit<P: Platform>(pm: &ProcessManager<P>) -> ! {
    pm.exit()
}

pub fn sys_wait<P: Platform>(pm: &ProcessManager<P>) -> isize {
    ret(pm.wait())
}

pub fn sys_kill<P: Platform>(pm: &ProcessManager<P>, pid: isize) -> isize {
    if pid <= 0 {
        return -1;
    }
    ret(pm.kill(pid as usize).map(|_| 0))
}

pub fn sys_getpid<P: Platform>(pm: &ProcessManager<P>) -> isize {
    ret(pm.current_pid().ok_or(ProcError::NoProcess))
}

pub fn sys_sbrk<P: Platform>(pm: &ProcessManager<P>, delta: isize) -> isize {
    ret(pm.grow(delta))
}

pub fn sys_sleep<P: Platform>(pm: &ProcessManager<P>, n: isize) -> isize {
    if n < 0 {
        return -1;
    }
    ret(pm.sleep_ticks(n as u64).map(|_| 0))
}

pub fn sys_uptime<P: Platform>(pm: &ProcessManager<P>) -> isize {
    pm.uptime() as isize
}

pub fn sys_settickets<P: Platform>(pm: &ProcessManager<P>, tickets: i32) -> isize {
    ret(pm.set_tickets(tickets).map(|_| 0))
}

pub fn sys_setpriority<P: Platform>(pm: &ProcessManager<P>, priority: i32) -> isize {
    ret(pm.set_priority(priority).map(|_| 0))
}

pub fn sys_getpinfo<P: Platform>(pm: &ProcessManager<P>, stat: Option<&mut PStat>) -> isize {
    ret(pm.snapshot_into(stat).map(|_| 0))
}

pub fn sys_yield<P: Platform>(pm: &ProcessManager<P>) -> isize {
    pm.yield_now();
    0
}
