use alloc::vec::Vec;

use crate::task::{
    Process,
    scheduler::{Scheduler, SchedulingPolicy},
};

/// Strict priority: only the numerically lowest runnable level runs, its
/// members round-robin in table order.
pub struct PriorityScheduler {
    /// 当前工作集对应的优先级，None 表示下一轮必须重建
    current_priority: Option<u32>,
    /// 工作集：构建时处于该优先级的所有槽位，不论状态
    queue: Vec<usize>,
}

impl PriorityScheduler {
    pub fn new() -> Self {
        Self {
            current_priority: None,
            queue: Vec::new(),
        }
    }

    fn rebuild(&mut self, procs: &[Process], priority: u32) {
        self.current_priority = Some(priority);
        self.queue.clear();
        self.queue.extend(
            procs
                .iter()
                .enumerate()
                .filter(|(_, p)| p.priority() == priority)
                .map(|(slot, _)| slot),
        );
    }
}

impl Default for PriorityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for PriorityScheduler {
    fn policy(&self) -> SchedulingPolicy {
        SchedulingPolicy::Priority
    }

    fn begin_round(&mut self, procs: &[Process]) -> usize {
        let Some(highest) = procs
            .iter()
            .filter(|p| p.is_runnable())
            .map(|p| p.priority())
            .min()
        else {
            return 0;
        };
        // 只有最高优先级发生变化时才重建工作集
        if self.current_priority != Some(highest) {
            self.rebuild(procs, highest);
        }
        self.queue.len()
    }

    fn slot(&self, turn: usize) -> usize {
        self.queue[turn]
    }

    fn round_finished(&mut self, planned: usize, dispatched: usize) {
        // 有成员在轮到时不可运行：下一轮整体重建，不做就地修补。
        // 同一优先级新变为可运行的进程也靠这次重建加入。
        if dispatched < planned {
            self.current_priority = None;
        }
    }
}
