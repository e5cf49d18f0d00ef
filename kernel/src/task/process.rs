use crate::{
    ProcError,
    config::{DEFAULT_PRIORITY, DEFAULT_TICKETS, MAX_PRIORITY, MIN_PRIORITY, PROC_NAME_LEN},
    hal::Platform,
    task::{Channel, pid::Pid},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcState {
    /// 槽位空闲
    Unused,
    /// 已分配，正在初始化，尚不可调度
    Embryo,
    Runnable,
    Running,
    /// 阻塞在某个 channel 上
    Sleeping,
    /// 已退出，等待父进程回收
    Zombie,
}

impl ProcState {
    /// Fixed-width label used by `procdump`.
    pub fn label(&self) -> &'static str {
        match self {
            ProcState::Unused => "unused",
            ProcState::Embryo => "embryo",
            ProcState::Runnable => "runble",
            ProcState::Running => "run   ",
            ProcState::Sleeping => "sleep ",
            ProcState::Zombie => "zombie",
        }
    }
}

/// Process descriptor: the scheduling state of one table slot.
///
/// Every field is guarded by the process table lock. Kernel stack, context,
/// address space and files live next to it in [`ProcData`].
#[derive(Debug, Clone)]
pub struct Process {
    pub(crate) pid: Pid,
    pub(crate) state: ProcState,
    /// 父进程所在的槽位（弱引用，不拥有父进程）
    pub(crate) parent: Option<usize>,
    /// 彩票数，>= 1
    pub(crate) tickets: u32,
    /// [0, 200]，数值越小越优先
    pub(crate) priority: u32,
    /// 被调度器选中的次数
    pub(crate) ticks: u64,
    pub(crate) chan: Option<Channel>,
    pub(crate) killed: bool,
    name: [u8; PROC_NAME_LEN],
}

impl Process {
    pub const fn new() -> Self {
        Self {
            pid: 0,
            state: ProcState::Unused,
            parent: None,
            tickets: DEFAULT_TICKETS,
            priority: DEFAULT_PRIORITY,
            ticks: 0,
            chan: None,
            killed: false,
            name: [0; PROC_NAME_LEN],
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> ProcState {
        self.state
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn tickets(&self) -> u32 {
        self.tickets
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn channel(&self) -> Option<Channel> {
        self.chan
    }

    pub fn killed(&self) -> bool {
        self.killed
    }

    pub fn is_runnable(&self) -> bool {
        self.state == ProcState::Runnable
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(PROC_NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("?")
    }

    /// Copies at most `PROC_NAME_LEN - 1` bytes, always leaving a terminator.
    pub fn set_name(&mut self, name: &str) {
        let mut len = name.len().min(PROC_NAME_LEN - 1);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        self.name = [0; PROC_NAME_LEN];
        self.name[..len].copy_from_slice(&name.as_bytes()[..len]);
    }

    pub(crate) fn copy_name_from(&mut self, other: &Process) {
        self.name = other.name;
    }

    pub fn set_tickets(&mut self, tickets: i32) -> Result<(), ProcError> {
        if tickets < 1 {
            return Err(ProcError::InvalidArgument);
        }
        self.tickets = tickets as u32;
        Ok(())
    }

    pub fn set_priority(&mut self, priority: i32) -> Result<(), ProcError> {
        if priority < MIN_PRIORITY as i32 || priority > MAX_PRIORITY as i32 {
            return Err(ProcError::InvalidArgument);
        }
        self.priority = priority as u32;
        Ok(())
    }
}

impl Default for Process {
    fn default() -> Self {
        Self::new()
    }
}

/// Resources owned by a slot but not designed here.
///
/// Access rule: the process running in the slot owns its data; while the
/// slot is EMBRYO the allocating thread owns it; a ZOMBIE's data belongs to
/// the parent that reaps it under the table lock.
pub struct ProcData<P: Platform> {
    pub kstack: Option<P::KernelStack>,
    pub context: P::Context,
    pub memory: Option<P::AddressSpace>,
    pub fs: Option<P::FsContext>,
}

impl<P: Platform> ProcData<P> {
    pub fn new() -> Self {
        Self {
            kstack: None,
            context: P::Context::default(),
            memory: None,
            fs: None,
        }
    }

    pub fn kstack(&self) -> &P::KernelStack {
        self.kstack.as_ref().expect("process without kernel stack")
    }

    pub fn kstack_mut(&mut self) -> &mut P::KernelStack {
        self.kstack.as_mut().expect("process without kernel stack")
    }

    /// Free the kernel stack and address space (`kfree` + `freevm`).
    pub fn release(&mut self) {
        self.kstack = None;
        self.memory = None;
        self.fs = None;
        self.context = P::Context::default();
    }
}

impl<P: Platform> Default for ProcData<P> {
    fn default() -> Self {
        Self::new()
    }
}
