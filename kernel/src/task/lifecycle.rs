use crate::{
    ProcError,
    hal::Platform,
    task::{Channel, ProcData, ProcState, ProcessManager, pid::Pid},
};

const INIT_NAME: &str = "initcode";

impl<P: Platform> ProcessManager<P> {
    /// # Safety
    /// The caller must own `slot`'s data under the rule documented on
    /// [`ProcData`].
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn data_mut(&self, slot: usize) -> &mut ProcData<P> {
        unsafe { &mut *self.data[slot].get() }
    }

    /// Claim a slot and give it a kernel stack whose context starts in the
    /// fork-return path. The slot stays EMBRYO.
    fn alloc_process(&self) -> Result<usize, ProcError> {
        let slot = self.lock_table().allocate()?;
        // EMBRYO：数据归分配者所有
        let data = unsafe { self.data_mut(slot) };
        let Some(kstack) = self.platform.alloc_kstack() else {
            warn!("alloc_process: no kernel stack for slot {}", slot);
            self.lock_table().abandon(slot);
            return Err(ProcError::ResourceExhausted);
        };
        data.context = self.platform.new_context(&kstack);
        data.kstack = Some(kstack);
        Ok(slot)
    }

    /// Create the first process. Panics if it cannot be created or already
    /// exists; the kernel cannot boot without it.
    pub fn user_init(&self) -> Pid {
        assert!(self.init_slot.get().is_none(), "userinit: init already created");
        let slot = self.alloc_process().expect("userinit: out of processes");

        let data = unsafe { self.data_mut(slot) };
        let space = self
            .platform
            .create_init_space()
            .expect("userinit: out of memory");
        data.memory = Some(space);
        self.platform.init_trap_frame(data.kstack_mut());
        data.fs = Some(self.platform.root_fs());

        let mut table = self.lock_table();
        let p = table.get_mut(slot);
        p.set_name(INIT_NAME);
        p.state = ProcState::Runnable;
        let pid = p.pid;
        self.init_slot.call_once(|| slot);
        info!("init process created: pid {} slot {}", pid, slot);
        pid
    }

    /// Create a copy of the calling process. Returns the child's pid; the
    /// child itself sees 0 through its trap frame.
    pub fn fork(&self) -> Result<Pid, ProcError> {
        let parent = self.current_slot().ok_or(ProcError::NoProcess)?;
        let child = self.alloc_process()?;

        // 父进程正在运行（就是调用者），子进程还是 EMBRYO
        let pdata = unsafe { &*self.data[parent].get() };
        let cdata = unsafe { self.data_mut(child) };

        let space = pdata
            .memory
            .as_ref()
            .and_then(|space| self.platform.copy_space(space));
        let Some(space) = space else {
            warn!("fork: cannot copy address space of slot {}", parent);
            cdata.release();
            self.lock_table().abandon(child);
            return Err(ProcError::ResourceExhausted);
        };
        cdata.memory = Some(space);
        self.platform.copy_trap_frame(pdata.kstack(), cdata.kstack_mut());
        cdata.fs = pdata.fs.as_ref().map(|fs| self.platform.dup_fs(fs));

        let mut table = self.lock_table();
        let from = table.get(parent).clone();
        let p = table.get_mut(child);
        p.parent = Some(parent);
        // 彩票数随 fork 继承，优先级不继承
        p.tickets = from.tickets;
        p.copy_name_from(&from);
        p.state = ProcState::Runnable;
        let pid = p.pid;
        debug!("fork: pid {} -> pid {}", from.pid, pid);
        Ok(pid)
    }

    /// Terminate the calling process. It stays a ZOMBIE until its parent
    /// reaps it in `wait`.
    pub fn exit(&self) -> ! {
        let slot = self.current_slot().expect("exit: no process");
        let init = *self.init_slot.get().expect("exit: no init process");
        if slot == init {
            panic!("init exiting");
        }

        // 关闭文件可能睡眠，必须在拿表锁之前做完
        unsafe { self.data_mut(slot) }.fs = None;

        let mut table = self.lock_table();
        // 父进程可能正睡在 wait 里
        if let Some(parent) = table.get(slot).parent {
            table.wakeup(Channel::Process(parent));
        }
        if table.reparent_children(slot, init) {
            table.wakeup(Channel::Process(init));
        }
        table.get_mut(slot).state = ProcState::Zombie;
        debug!("exit: pid {} is a zombie", table.get(slot).pid);

        let _table = self.sched(table);
        panic!("zombie exit");
    }

    /// Reap one exited child and return its pid.
    pub fn wait(&self) -> Result<Pid, ProcError> {
        let slot = self.current_slot().ok_or(ProcError::NoProcess)?;
        let mut table = self.lock_table();
        loop {
            let (have_kids, zombie) = table.zombie_child(slot);
            if let Some(child) = zombie {
                // 僵尸进程的数据归回收它的父进程
                unsafe { self.data_mut(child) }.release();
                let pid = table.reclaim(child, slot);
                return Ok(pid);
            }
            if !have_kids {
                return Err(ProcError::NoChildren);
            }
            if table.get(slot).killed {
                return Err(ProcError::Interrupted);
            }
            table = self.sleep_on_table(Channel::Process(slot), table);
        }
    }

    /// Mark `pid` killed. It exits the next time it checks on its way back
    /// to user space.
    pub fn kill(&self, pid: Pid) -> Result<(), ProcError> {
        let result = self.lock_table().kill(pid);
        if result.is_ok() {
            debug!("kill: pid {}", pid);
        }
        result
    }

    pub fn set_tickets(&self, tickets: i32) -> Result<(), ProcError> {
        let slot = self.current_slot().ok_or(ProcError::NoProcess)?;
        self.lock_table().get_mut(slot).set_tickets(tickets)
    }

    pub fn set_priority(&self, priority: i32) -> Result<(), ProcError> {
        let slot = self.current_slot().ok_or(ProcError::NoProcess)?;
        self.lock_table().get_mut(slot).set_priority(priority)
    }

    /// Grow or shrink the caller's memory by `delta` bytes. Returns the old
    /// size.
    pub fn grow(&self, delta: isize) -> Result<usize, ProcError> {
        let slot = self.current_slot().ok_or(ProcError::NoProcess)?;
        let data = unsafe { self.data_mut(slot) };
        let space = data.memory.as_mut().ok_or(ProcError::NoProcess)?;
        let old = self.platform.space_size(space);
        self.platform
            .resize_space(space, delta)
            .ok_or(ProcError::ResourceExhausted)?;
        self.platform.activate_space(Some(space));
        Ok(old)
    }

    pub fn current_pid(&self) -> Option<Pid> {
        let slot = self.current_slot()?;
        Some(self.lock_table().get(slot).pid)
    }

    pub fn current_killed(&self) -> bool {
        match self.current_slot() {
            Some(slot) => self.lock_table().get(slot).killed,
            None => false,
        }
    }

    /// Called on the way back to user space.
    pub fn exit_if_killed(&self) {
        if self.current_killed() {
            self.exit();
        }
    }
}
