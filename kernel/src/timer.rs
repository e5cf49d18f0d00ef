//! Timer ticks: the clock interrupt count and tick-based sleeping.

use crate::{
    ProcError,
    hal::Platform,
    task::{Channel, ProcessManager},
};

impl<P: Platform> ProcessManager<P> {
    /// Advance the tick count, on one CPU only. Called from the timer
    /// interrupt.
    pub fn clock_tick(&self) {
        let mut ticks = self.acquire(&self.ticks);
        *ticks += 1;
        self.wakeup(Channel::of(&self.ticks));
        drop(ticks);
    }

    /// 开机以来的时钟中断次数
    pub fn uptime(&self) -> u64 {
        *self.acquire(&self.ticks)
    }

    /// Block the calling process for at least `n` ticks.
    pub fn sleep_ticks(&self, n: u64) -> Result<(), ProcError> {
        let mut ticks = self.acquire(&self.ticks);
        let start = *ticks;
        while *ticks - start < n {
            if self.current_killed() {
                return Err(ProcError::Interrupted);
            }
            ticks = self.sleep(Channel::of(&self.ticks), ticks);
        }
        Ok(())
    }
}
