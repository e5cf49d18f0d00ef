use crate::{
    ProcError,
    config::{DEFAULT_PRIORITY, DEFAULT_TICKETS, NPROC},
    task::{
        Channel, ProcState, Process, ProcessStats,
        pid::{INIT_PID, Pid, PidAllocator},
        pstat::{PStat, PStatRow},
    },
};

/// 进程表：固定数量的槽位，槽位下标即进程的稳定标识
///
/// The table itself does no locking; the process manager keeps it behind the
/// single table lock and every method here assumes that lock is held.
#[derive(Debug)]
pub struct ProcTable {
    procs: [Process; NPROC],
    pids: PidAllocator,
}

impl ProcTable {
    pub const fn new() -> Self {
        Self {
            procs: [const { Process::new() }; NPROC],
            pids: PidAllocator::new(INIT_PID),
        }
    }

    pub fn procs(&self) -> &[Process] {
        &self.procs
    }

    pub fn get(&self, slot: usize) -> &Process {
        &self.procs[slot]
    }

    pub fn get_mut(&mut self, slot: usize) -> &mut Process {
        &mut self.procs[slot]
    }

    /// Slot of the process with `pid`, skipping free slots.
    pub fn find(&self, pid: Pid) -> Option<usize> {
        if pid == 0 {
            return None;
        }
        self.procs
            .iter()
            .position(|p| p.state != ProcState::Unused && p.pid == pid)
    }

    /// Claim an UNUSED slot: EMBRYO, next pid, default tickets and priority.
    pub fn allocate(&mut self) -> Result<usize, ProcError> {
        let Some(slot) = self.procs.iter().position(|p| p.state == ProcState::Unused) else {
            return Err(ProcError::ResourceExhausted);
        };
        let pid = self.pids.alloc();
        let p = &mut self.procs[slot];
        *p = Process::new();
        p.state = ProcState::Embryo;
        p.pid = pid;
        p.tickets = DEFAULT_TICKETS;
        p.ticks = 0;
        p.priority = DEFAULT_PRIORITY;
        debug!("allocated slot {} for pid {}", slot, pid);
        Ok(slot)
    }

    /// Give back a slot whose setup failed.
    pub fn abandon(&mut self, slot: usize) {
        assert_eq!(
            self.procs[slot].state,
            ProcState::Embryo,
            "abandon: slot is not an embryo"
        );
        debug!("abandoned slot {} (pid {})", slot, self.procs[slot].pid);
        self.procs[slot] = Process::new();
    }

    /// Reset a reaped zombie to UNUSED and return its pid.
    pub fn reclaim(&mut self, slot: usize, reaper: usize) -> Pid {
        let p = &mut self.procs[slot];
        assert_eq!(p.state, ProcState::Zombie, "reclaim: slot is not a zombie");
        assert_eq!(p.parent, Some(reaper), "reclaim: not the parent");
        let pid = p.pid;
        *p = Process::new();
        pid
    }

    /// Mark every process sleeping on `chan` RUNNABLE. Returns how many woke.
    pub fn wakeup(&mut self, chan: Channel) -> usize {
        let mut woken = 0;
        for p in self.procs.iter_mut() {
            if p.state == ProcState::Sleeping && p.chan == Some(chan) {
                p.state = ProcState::Runnable;
                woken += 1;
            }
        }
        woken
    }

    /// Set the killed flag and pull the target out of sleep.
    pub fn kill(&mut self, pid: Pid) -> Result<(), ProcError> {
        let slot = self.find(pid).ok_or(ProcError::InvalidArgument)?;
        let p = &mut self.procs[slot];
        p.killed = true;
        if p.state == ProcState::Sleeping {
            p.state = ProcState::Runnable;
        }
        Ok(())
    }

    /// Whether `parent` has children, and the first zombie among them.
    pub fn zombie_child(&self, parent: usize) -> (bool, Option<usize>) {
        let mut have_kids = false;
        for (slot, p) in self.procs.iter().enumerate() {
            if p.parent != Some(parent) {
                continue;
            }
            have_kids = true;
            if p.state == ProcState::Zombie {
                return (true, Some(slot));
            }
        }
        (have_kids, None)
    }

    /// Hand every child of `from` to `to`. Returns true if one of them is
    /// already a zombie, in which case `to` must be woken.
    pub fn reparent_children(&mut self, from: usize, to: usize) -> bool {
        let mut zombie = false;
        for p in self.procs.iter_mut() {
            if p.parent == Some(from) {
                p.parent = Some(to);
                zombie |= p.state == ProcState::Zombie;
            }
        }
        zombie
    }

    /// Append one row per slot that is neither EMBRYO nor ZOMBIE.
    pub fn snapshot_into(&self, out: &mut PStat) -> usize {
        out.clear();
        for p in self.procs.iter() {
            let row = match p.state {
                ProcState::Embryo | ProcState::Zombie => continue,
                ProcState::Unused => PStatRow::default(),
                _ => PStatRow {
                    in_use: true,
                    tickets: p.tickets,
                    pid: p.pid,
                    ticks: p.ticks,
                    priority: p.priority,
                },
            };
            if !out.push(row) {
                break;
            }
        }
        out.len()
    }

    pub fn stats(&self) -> ProcessStats {
        let mut stats = ProcessStats::default();
        for p in self.procs.iter() {
            match p.state {
                ProcState::Unused => continue,
                ProcState::Embryo => stats.embryo += 1,
                ProcState::Runnable => stats.runnable += 1,
                ProcState::Running => stats.running += 1,
                ProcState::Sleeping => stats.sleeping += 1,
                ProcState::Zombie => stats.zombie += 1,
            }
            stats.total += 1;
        }
        stats
    }
}

impl Default for ProcTable {
    fn default() -> Self {
        Self::new()
    }
}
