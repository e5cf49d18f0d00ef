use alloc::boxed::Box;
use core::ops::{Deref, DerefMut};

use crate::{
    hal::Platform,
    sync::{SpinLock, SpinLockGuard},
    task::{
        ProcState, ProcessManager,
        scheduler::{self, Scheduler, SchedulingPolicy},
        table::ProcTable,
    },
};

/// Per-CPU 状态，每个核心只访问自己的那一份
pub struct Processor<P: Platform> {
    pub hart_id: usize,
    /// 当前运行进程的槽位
    pub current: Option<usize>,
    /// 调度循环的上下文，进程通过 `sched` 切回这里
    pub context: P::Context,
    pub scheduler: Box<dyn Scheduler>,
    /// push_off 嵌套深度
    noff: usize,
    /// 第一次 push_off 之前中断是否打开
    intena: bool,
}

impl<P: Platform> Processor<P> {
    pub fn new(hart_id: usize, policy: SchedulingPolicy) -> Self {
        Self {
            hart_id,
            current: None,
            context: P::Context::default(),
            scheduler: scheduler::build(policy, hart_id),
            noff: 0,
            intena: false,
        }
    }
}

/// A spin lock held with interrupts disabled on this CPU.
///
/// Interrupts stay off for as long as the guard is alive, so an interrupt
/// handler on the same CPU can never spin on a lock its own CPU holds.
pub struct IrqGuard<'a, T, P: Platform> {
    guard: Option<SpinLockGuard<'a, T>>,
    manager: &'a ProcessManager<P>,
}

/// Holding the process table lock.
pub type TableGuard<'a, P> = IrqGuard<'a, ProcTable, P>;

impl<'a, T, P: Platform> IrqGuard<'a, T, P> {
    /// Release the lock, then the interrupt nesting level taken with it.
    pub fn release(mut self) -> &'a SpinLock<T> {
        let guard = self.guard.take().expect("lock guard released");
        SpinLock::unlock(guard)
    }
}

impl<T, P: Platform> Deref for IrqGuard<'_, T, P> {
    type Target = T;

    fn deref(&self) -> &T {
        self.guard.as_ref().expect("lock guard released")
    }
}

impl<T, P: Platform> DerefMut for IrqGuard<'_, T, P> {
    fn deref_mut(&mut self) -> &mut T {
        self.guard.as_mut().expect("lock guard released")
    }
}

impl<T, P: Platform> Drop for IrqGuard<'_, T, P> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.manager.pop_off();
    }
}

impl<P: Platform> ProcessManager<P> {
    /// 当前 CPU 的 Processor
    ///
    /// # Safety
    /// Interrupts must be off so the caller cannot migrate, and the returned
    /// reference must not outlive a context switch.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn cpu(&self) -> &mut Processor<P> {
        let id = self.platform.cpu_id();
        unsafe { &mut *self.cpus[id].get() }
    }

    /// Disable interrupts, nesting. Matched by `pop_off`.
    pub(crate) fn push_off(&self) {
        let old = self.platform.intr_get();
        self.platform.intr_off();
        let cpu = unsafe { self.cpu() };
        if cpu.noff == 0 {
            cpu.intena = old;
        }
        cpu.noff += 1;
    }

    pub(crate) fn pop_off(&self) {
        let cpu = unsafe { self.cpu() };
        assert!(!self.platform.intr_get(), "pop_off - interruptible");
        assert!(cpu.noff >= 1, "pop_off");
        cpu.noff -= 1;
        if cpu.noff == 0 && cpu.intena {
            self.platform.intr_on();
        }
    }

    /// Acquire `lock` with interrupts disabled on this CPU.
    pub fn acquire<'a, T>(&'a self, lock: &'a SpinLock<T>) -> IrqGuard<'a, T, P> {
        self.push_off();
        IrqGuard {
            guard: Some(lock.lock()),
            manager: self,
        }
    }

    pub(crate) fn lock_table(&self) -> TableGuard<'_, P> {
        self.acquire(&self.table)
    }

    /// Slot of the process running on this CPU.
    pub fn current_slot(&self) -> Option<usize> {
        self.push_off();
        let slot = unsafe { self.cpu() }.current;
        self.pop_off();
        slot
    }

    /// Switch from the current process to this CPU's scheduler.
    ///
    /// The caller holds the table lock and nothing else, and has already
    /// moved the process out of RUNNING. The lock comes back held.
    pub(crate) fn sched<'a>(&'a self, table: TableGuard<'a, P>) -> TableGuard<'a, P> {
        let cpu = unsafe { self.cpu() };
        let slot = cpu.current.expect("sched no process");
        assert!(self.table.is_locked(), "sched ptable.lock");
        assert_eq!(cpu.noff, 1, "sched locks");
        assert_ne!(table.get(slot).state, ProcState::Running, "sched running");
        assert!(!self.platform.intr_get(), "sched interruptible");

        let intena = cpu.intena;
        let save = unsafe { &raw mut (*self.data[slot].get()).context };
        let load = &raw const cpu.context;
        unsafe { self.platform.switch(save, load) };

        // 可能已经换了一个 CPU
        let cpu = unsafe { self.cpu() };
        cpu.intena = intena;
        table
    }

    /// Run `slot` until it switches back. Table lock held throughout.
    fn dispatch(&self, table: &mut TableGuard<'_, P>, slot: usize) {
        let p = table.get_mut(slot);
        p.state = ProcState::Running;
        p.ticks += 1;

        let cpu = unsafe { self.cpu() };
        cpu.current = Some(slot);
        let data = self.data[slot].get();
        unsafe {
            self.platform.activate_space((*data).memory.as_ref());
            self.platform.switch(&raw mut cpu.context, &raw const (*data).context);
        }
        self.platform.activate_space(None);

        let cpu = unsafe { self.cpu() };
        cpu.current = None;
    }

    /// One pass of this CPU's scheduling loop. Returns how many processes
    /// were dispatched.
    pub fn schedule_round(&self) -> usize {
        let mut table = self.lock_table();
        let turns = unsafe { self.cpu() }.scheduler.begin_round(table.procs());

        let mut dispatched = 0;
        for turn in 0..turns {
            let slot = unsafe { self.cpu() }.scheduler.slot(turn);
            // 轮到它之前可能已经睡眠或退出
            if !table.get(slot).is_runnable() {
                continue;
            }
            self.dispatch(&mut table, slot);
            dispatched += 1;
        }

        unsafe { self.cpu() }
            .scheduler
            .round_finished(turns, dispatched);
        dispatched
    }

    /// Per-CPU scheduler loop. Never returns.
    pub fn scheduler(&self) -> ! {
        let hart = self.platform.cpu_id();
        info!(
            "[CPU{}] scheduler started ({:?})",
            hart,
            unsafe { self.cpu() }.scheduler.policy()
        );
        loop {
            // 允许中断，否则所有进程都在等 I/O 时会死锁
            self.platform.intr_on();
            if self.schedule_round() == 0 {
                self.platform.wait_for_interrupt();
            }
        }
    }

    /// Give up the CPU for one scheduling round.
    pub fn yield_now(&self) {
        let Some(slot) = self.current_slot() else {
            return;
        };
        let mut table = self.lock_table();
        table.get_mut(slot).state = ProcState::Runnable;
        drop(self.sched(table));
    }

    /// First code a new process runs after its first dispatch: drop the
    /// table lock the scheduler acquired on its behalf.
    pub fn fork_return(&self) {
        unsafe { self.table.force_unlock() };
        self.pop_off();
    }
}
