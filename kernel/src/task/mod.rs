//! 进程管理：进程表、调度、睡眠/唤醒和 fork/exit/wait

mod channel;
mod lifecycle;
mod manager;
mod pid;
mod process;
mod processor;
mod pstat;
pub mod scheduler;
mod table;

pub use channel::Channel;
pub use manager::{ProcessManager, ProcessStats};
pub use pid::{INIT_PID, Pid};
pub use process::{ProcData, ProcState, Process};
pub use processor::{IrqGuard, Processor, TableGuard};
pub use pstat::{PStat, PStatRow};
pub use scheduler::SchedulingPolicy;
pub use table::ProcTable;
