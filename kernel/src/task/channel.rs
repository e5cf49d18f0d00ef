use crate::{
    hal::Platform,
    task::{IrqGuard, ProcState, ProcessManager, TableGuard},
};

/// Opaque wait token.
///
/// Two sleepers block on the same event exactly when their channels compare
/// equal. Nothing else is ever read from a channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// 进程本身（按槽位），wait 的父进程睡在自己的槽位上
    Process(usize),
    /// 任意内核对象的地址
    Address(usize),
}

impl Channel {
    /// Channel named by the address of `obj`.
    pub fn of<T: ?Sized>(obj: &T) -> Self {
        Channel::Address(obj as *const T as *const u8 as usize)
    }
}

impl<P: Platform> ProcessManager<P> {
    /// Atomically release `cond` and block the current process on `chan`.
    ///
    /// The table lock is taken before `cond` is released and `wakeup` needs
    /// the table lock too, so a wakeup issued after the caller checked its
    /// condition cannot slip in before the process is marked SLEEPING.
    /// `cond` is re-acquired before returning.
    pub fn sleep<'a, T>(&'a self, chan: Channel, cond: IrqGuard<'a, T, P>) -> IrqGuard<'a, T, P> {
        let table = self.lock_table();
        // 释放 cond 连同它的中断嵌套层，sched 时只剩表锁这一层
        let cond = cond.release();
        let table = self.sleep_on_table(chan, table);
        drop(table);
        self.acquire(cond)
    }

    /// Sleep when the condition itself is guarded by the table lock.
    pub(crate) fn sleep_on_table<'a>(
        &'a self,
        chan: Channel,
        mut table: TableGuard<'a, P>,
    ) -> TableGuard<'a, P> {
        let slot = self.current_slot().expect("sleep");
        let p = table.get_mut(slot);
        p.chan = Some(chan);
        p.state = ProcState::Sleeping;

        let mut table = self.sched(table);

        table.get_mut(slot).chan = None;
        table
    }

    /// Wake every process sleeping on `chan`. Waking nobody is not an error.
    pub fn wakeup(&self, chan: Channel) {
        let woken = self.lock_table().wakeup(chan);
        if woken > 0 {
            trace!("wakeup {:?}: {} process(es)", chan, woken);
        }
    }
}
