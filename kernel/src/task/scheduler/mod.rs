use alloc::boxed::Box;

use crate::{config::LOTTERY_SEED, random::KernelRng, task::Process};

pub mod lottery_scheduler;
pub mod priority_scheduler;

pub use lottery_scheduler::LotteryScheduler;
pub use priority_scheduler::PriorityScheduler;

/// 调度策略，启动时选定，运行期间不变
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingPolicy {
    /// 严格优先级，同一优先级内轮转
    Priority,
    /// 按彩票数加权的抽签
    Lottery,
}

/// Selection strategy of one CPU's scheduling loop.
///
/// The loop calls `begin_round` with the table locked, then asks for the
/// slot of each turn and dispatches it, skipping any that stopped being
/// RUNNABLE before its turn. Dispatch, tick accounting and the context
/// switch are shared by every policy.
pub trait Scheduler: Send {
    fn policy(&self) -> SchedulingPolicy;

    /// Plan the next round and return its number of turns, zero when
    /// nothing is runnable.
    fn begin_round(&mut self, procs: &[Process]) -> usize;

    /// Slot planned for `turn`, which is below the count `begin_round`
    /// returned.
    fn slot(&self, turn: usize) -> usize;

    /// How the round went: `dispatched` of the `planned` turns actually ran.
    fn round_finished(&mut self, _planned: usize, _dispatched: usize) {}
}

pub fn build(policy: SchedulingPolicy, hart_id: usize) -> Box<dyn Scheduler> {
    match policy {
        SchedulingPolicy::Priority => Box::new(PriorityScheduler::new()),
        SchedulingPolicy::Lottery => Box::new(LotteryScheduler::new(KernelRng::new(
            LOTTERY_SEED ^ hart_id as u64,
        ))),
    }
}
