use core::fmt;

use crate::{config::NPROC, task::pid::Pid};

/// One row of a process snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PStatRow {
    pub in_use: bool,
    pub tickets: u32,
    pub pid: Pid,
    /// 累计被调度的次数
    pub ticks: u64,
    pub priority: u32,
}

impl PStatRow {
    fn is_blank(&self) -> bool {
        !self.in_use && self.pid == 0 && self.tickets == 0 && self.ticks == 0
    }
}

/// Point-in-time copy of the process table, as returned by `getpinfo`.
///
/// Holds at most `NPROC` rows in table order. Rows are values, they never
/// alias live descriptors.
#[derive(Debug, Clone)]
pub struct PStat {
    rows: [PStatRow; NPROC],
    len: usize,
}

impl PStat {
    pub const fn new() -> Self {
        Self {
            rows: [PStatRow {
                in_use: false,
                tickets: 0,
                pid: 0,
                ticks: 0,
                priority: 0,
            }; NPROC],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        NPROC
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Returns false once the buffer is full.
    pub(crate) fn push(&mut self, row: PStatRow) -> bool {
        if self.len == NPROC {
            return false;
        }
        self.rows[self.len] = row;
        self.len += 1;
        true
    }

    pub fn rows(&self) -> &[PStatRow] {
        &self.rows[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn find(&self, pid: Pid) -> Option<&PStatRow> {
        self.rows().iter().find(|row| row.in_use && row.pid == pid)
    }
}

impl Default for PStat {
    fn default() -> Self {
        Self::new()
    }
}

/// The `ps` listing: rows whose every field is zero are left out.
impl fmt::Display for PStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " used | pid  |tickets| ticks | prio")?;
        for row in self.rows().iter().filter(|row| !row.is_blank()) {
            writeln!(
                f,
                "   {}  | {:>4} | {:>5} | {:>5} | {:>4}",
                row.in_use as u8, row.pid, row.tickets, row.ticks, row.priority
            )?;
        }
        Ok(())
    }
}
