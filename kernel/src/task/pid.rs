pub type Pid = usize;

/// 0 表示槽位未分配 pid，第一个进程（init）的 pid 为 1
pub const INIT_PID: Pid = 1;

/// Monotonic pid source.
///
/// Pids are never recycled: a zombie's parent link or a stale pid held by a
/// user program must never name a newer process.
#[derive(Debug)]
pub struct PidAllocator {
    next: Pid,
}

impl PidAllocator {
    pub const fn new(first: Pid) -> Self {
        Self { next: first }
    }

    pub fn alloc(&mut self) -> Pid {
        let pid = self.next;
        self.next += 1;
        pid
    }

    /// The pid the next allocation will return.
    pub fn peek(&self) -> Pid {
        self.next
    }
}
