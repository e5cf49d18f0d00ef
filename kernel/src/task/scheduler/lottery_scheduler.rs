use rand_core::RngCore;

use crate::{
    random::{self, KernelRng},
    task::{
        Process,
        scheduler::{Scheduler, SchedulingPolicy},
    },
};

/// Ticket-weighted lottery: each round draws one winner among the runnable
/// processes with probability proportional to its tickets.
pub struct LotteryScheduler<R: RngCore + Send = KernelRng> {
    rng: R,
    /// 本轮中签的槽位
    winner: usize,
}

impl<R: RngCore + Send> LotteryScheduler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, winner: 0 }
    }
}

/// Sum of tickets over runnable processes.
pub fn total_tickets(procs: &[Process]) -> u64 {
    procs
        .iter()
        .filter(|p| p.is_runnable())
        .map(|p| p.tickets() as u64)
        .sum()
}

/// First runnable slot, in table order, whose running ticket total reaches
/// `draw`. `draw` is in `[1, total_tickets]`.
pub fn pick_winner(procs: &[Process], draw: u64) -> Option<usize> {
    let mut counter = 0u64;
    for (slot, p) in procs.iter().enumerate() {
        if !p.is_runnable() {
            continue;
        }
        counter += p.tickets() as u64;
        if counter >= draw {
            return Some(slot);
        }
    }
    None
}

impl<R: RngCore + Send> Scheduler for LotteryScheduler<R> {
    fn policy(&self) -> SchedulingPolicy {
        SchedulingPolicy::Lottery
    }

    fn begin_round(&mut self, procs: &[Process]) -> usize {
        let total = total_tickets(procs);
        if total == 0 {
            return 0;
        }
        let draw = random::bounded(&mut self.rng, total) + 1;
        match pick_winner(procs, draw) {
            Some(slot) => {
                self.winner = slot;
                1
            }
            None => 0,
        }
    }

    fn slot(&self, _turn: usize) -> usize {
        self.winner
    }
}
