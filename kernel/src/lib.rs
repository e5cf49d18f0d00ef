//! Process-management core: the process table, the priority and lottery
//! schedulers, sleep/wakeup and the fork/exit/wait protocol.
//!
//! Everything hardware-specific (context switch, interrupts, address spaces,
//! kernel stacks, open files) is reached through [`hal::Platform`].

#![cfg_attr(not(test), no_std)]

extern crate alloc;
#[macro_use]
extern crate log;

#[macro_use]
pub mod console;
pub mod config;
pub mod error;
pub mod hal;
pub mod logging;
pub mod random;
pub mod sync;
pub mod syscall;
pub mod task;
pub mod timer;

pub use error::ProcError;
pub use hal::Platform;
pub use task::{
    Channel, IrqGuard, Pid, ProcState, Process, ProcessManager, ProcessStats, PStat, PStatRow,
    SchedulingPolicy,
};
