//! 统一的进程管理器
//!
//! 进程表、每个槽位的资源、每个 CPU 的调度器都挂在这里。所有对进程状态的
//! 修改都发生在进程表锁之下。

use core::cell::UnsafeCell;

use spin::Once;

use crate::{
    ProcError,
    config::{NCPU, NPROC},
    hal::Platform,
    sync::SpinLock,
    task::{
        ProcData, ProcState, Processor, SchedulingPolicy,
        pstat::PStat,
        table::ProcTable,
    },
};

/// 进程状态统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub total: usize,
    pub embryo: usize,
    pub runnable: usize,
    pub running: usize,
    pub sleeping: usize,
    pub zombie: usize,
}

pub struct ProcessManager<P: Platform> {
    pub(crate) platform: P,
    pub(crate) table: SpinLock<ProcTable>,
    /// Per-slot resources, outside the table lock. See [`ProcData`] for who
    /// may touch which slot.
    pub(crate) data: [UnsafeCell<ProcData<P>>; NPROC],
    pub(crate) cpus: [UnsafeCell<Processor<P>>; NCPU],
    /// init 进程的槽位
    pub(crate) init_slot: Once<usize>,
    /// 时钟中断计数，同时作为 sleep_ticks 的 channel
    pub(crate) ticks: SpinLock<u64>,
    policy: SchedulingPolicy,
}

unsafe impl<P: Platform> Sync for ProcessManager<P> {}

impl<P: Platform> ProcessManager<P> {
    pub fn new(platform: P, policy: SchedulingPolicy) -> Self {
        info!("process manager: {} slots, {:?} scheduling", NPROC, policy);
        Self {
            platform,
            table: SpinLock::new(ProcTable::new()),
            data: core::array::from_fn(|_| UnsafeCell::new(ProcData::new())),
            cpus: core::array::from_fn(|hart| UnsafeCell::new(Processor::new(hart, policy))),
            init_slot: Once::new(),
            ticks: SpinLock::new(0),
            policy,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    /// Copy the table into `out` under one lock hold. Returns the number of
    /// rows written.
    pub fn snapshot_into(&self, out: Option<&mut PStat>) -> Result<usize, ProcError> {
        let out = out.ok_or(ProcError::InvalidArgument)?;
        Ok(self.lock_table().snapshot_into(out))
    }

    pub fn snapshot(&self) -> PStat {
        let mut out = PStat::new();
        self.lock_table().snapshot_into(&mut out);
        out
    }

    pub fn process_stats(&self) -> ProcessStats {
        self.lock_table().stats()
    }

    /// Print a listing of live processes to the console.
    ///
    /// Runs from the console's debug key, possibly while the machine is
    /// wedged, so it never waits for the table lock and may read it torn.
    pub fn procdump(&self) {
        self.push_off();
        let guard = self.table.try_lock();
        let table: &ProcTable = match guard.as_ref() {
            Some(guard) => &**guard,
            None => unsafe { &*self.table.data_ptr() },
        };
        for p in table.procs().iter() {
            if p.state() == ProcState::Unused {
                continue;
            }
            println!("{} {} {}", p.pid(), p.state().label(), p.name());
        }
        drop(guard);
        self.pop_off();
    }
}
