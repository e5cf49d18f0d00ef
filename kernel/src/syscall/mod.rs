mod process;

pub use process::*;

use crate::{hal::Platform, task::{PStat, ProcessManager}};

pub const SYSCALL_FORK: usize = 1;
pub const SYSCALL_EXIT: usize = 2;
pub const SYSCALL_WAIT: usize = 3;
pub const SYSCALL_KILL: usize = 6;
pub const SYSCALL_GETPID: usize = 11;
pub const SYSCALL_SBRK: usize = 12;
pub const SYSCALL_SLEEP: usize = 13;
pub const SYSCALL_UPTIME: usize = 14;
pub const SYSCALL_SETTICKETS: usize = 22;
pub const SYSCALL_GETPINFO: usize = 23;
pub const SYSCALL_SETPRIORITY: usize = 24;
pub const SYSCALL_YIELD: usize = 25;

/// Dispatch one process-management system call.
///
/// `args` are the raw argument registers. For `getpinfo` the trap layer has
/// already translated the user pointer to a kernel address (or 0).
pub fn syscall<P: Platform>(pm: &ProcessManager<P>, syscall_id: usize, args: [usize; 3]) -> isize {
    trace!(
        "syscall id={}, args=[{:#x}, {:#x}, {:#x}]",
        syscall_id, args[0], args[1], args[2]
    );
    match syscall_id {
        SYSCALL_FORK => sys_fork(pm),
        SYSCALL_EXIT => sys_exit(pm),
        SYSCALL_WAIT => sys_wait(pm),
        SYSCALL_KILL => sys_kill(pm, args[0] as isize),
        SYSCALL_GETPID => sys_getpid(pm),
        SYSCALL_SBRK => sys_sbrk(pm, args[0] as isize),
        SYSCALL_SLEEP => sys_sleep(pm, args[0] as isize),
        SYSCALL_UPTIME => sys_uptime(pm),
        SYSCALL_SETTICKETS => sys_settickets(pm, args[0] as i32),
        SYSCALL_GETPINFO => {
            let stat = unsafe { (args[0] as *mut PStat).as_mut() };
            sys_getpinfo(pm, stat)
        }
        SYSCALL_SETPRIORITY => sys_setpriority(pm, args[0] as i32),
        SYSCALL_YIELD => sys_yield(pm),
        _ => {
            warn!("syscall: invalid syscall_id: {}", syscall_id);
            -1
        }
    }
}
