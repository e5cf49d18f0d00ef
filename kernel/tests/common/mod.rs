//! Host simulation of the platform.
//!
//! Every simulated CPU's scheduler loop and every process runs on its own OS
//! thread. A context is a baton: `switch` hands the CPU id to the thread
//! owning the target context and parks the caller until someone switches
//! back to it, so exactly one thread runs per simulated CPU.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use kproc::{
    Channel, Pid, Platform, ProcError, ProcessManager, SchedulingPolicy, config::NCPU,
    sync::SpinLock,
};

pub type Kernel = ProcessManager<SimPlatform>;

pub const TIMEOUT: Duration = Duration::from_secs(20);

/// Initial size of every simulated address space.
pub const INIT_SPACE_SIZE: usize = 4096;

type Program = Box<dyn FnOnce() + Send>;

thread_local! {
    /// 当前线程正在模拟的 CPU，不运行在任何 CPU 上的线程（测试主线程）用最后一个
    static CPU: Cell<usize> = const { Cell::new(NCPU - 1) };
    /// 下一次 init_trap_frame / copy_trap_frame 要装入的用户程序
    static PENDING: RefCell<Option<Program>> = const { RefCell::new(None) };
}

struct Baton {
    turn: Mutex<Option<usize>>,
    cond: Condvar,
    started: AtomicBool,
    program: Mutex<Option<Program>>,
}

impl Baton {
    fn new(started: bool) -> Arc<Self> {
        Arc::new(Self {
            turn: Mutex::new(None),
            cond: Condvar::new(),
            started: AtomicBool::new(started),
            program: Mutex::new(None),
        })
    }

    fn post(&self, cpu: usize) {
        *self.turn.lock().unwrap() = Some(cpu);
        self.cond.notify_all();
    }

    fn wait(&self) -> usize {
        let mut turn = self.turn.lock().unwrap();
        loop {
            if let Some(cpu) = turn.take() {
                return cpu;
            }
            turn = self.cond.wait(turn).unwrap();
        }
    }
}

/// A default context belongs to a thread that already runs (a scheduler).
pub struct SimContext {
    baton: Arc<Baton>,
}

impl Default for SimContext {
    fn default() -> Self {
        Self {
            baton: Baton::new(true),
        }
    }
}

pub struct SimKernelStack {
    baton: Arc<Baton>,
    live: Arc<AtomicUsize>,
}

impl Drop for SimKernelStack {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct SimSpace {
    pub size: usize,
}

pub struct SimFs {
    open: Arc<AtomicUsize>,
}

impl Drop for SimFs {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct SimPlatform {
    intr: [AtomicBool; NCPU],
    kstacks: Arc<AtomicUsize>,
    fs_refs: Arc<AtomicUsize>,
    fail_copy_space: AtomicBool,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self {
            intr: [const { AtomicBool::new(false) }; NCPU],
            kstacks: Arc::new(AtomicUsize::new(0)),
            fs_refs: Arc::new(AtomicUsize::new(0)),
            fail_copy_space: AtomicBool::new(false),
        }
    }

    pub fn set_fail_copy_space(&self, fail: bool) {
        self.fail_copy_space.store(fail, Ordering::SeqCst);
    }

    pub fn live_kstacks(&self) -> usize {
        self.kstacks.load(Ordering::SeqCst)
    }

    pub fn open_fs_refs(&self) -> usize {
        self.fs_refs.load(Ordering::SeqCst)
    }

    fn take_pending() -> Program {
        PENDING.with(|p| p.borrow_mut().take()).expect("no program staged for new process")
    }
}

impl Platform for SimPlatform {
    type Context = SimContext;
    type KernelStack = SimKernelStack;
    type AddressSpace = SimSpace;
    type FsContext = SimFs;

    fn cpu_id(&self) -> usize {
        CPU.with(|c| c.get())
    }

    fn intr_get(&self) -> bool {
        self.intr[self.cpu_id()].load(Ordering::SeqCst)
    }

    fn intr_on(&self) {
        self.intr[self.cpu_id()].store(true, Ordering::SeqCst);
    }

    fn intr_off(&self) {
        self.intr[self.cpu_id()].store(false, Ordering::SeqCst);
    }

    fn wait_for_interrupt(&self) {
        // 空闲的调度线程会一直活到测试进程结束
        thread::sleep(Duration::from_millis(1));
    }

    unsafe fn switch(&self, save: *mut SimContext, load: *const SimContext) {
        // 切走之后 save 所在的槽位可能被回收，先把 baton 拿出来
        let me = unsafe { (*save).baton.clone() };
        let next = unsafe { (*load).baton.clone() };
        let cpu = self.cpu_id();

        if !next.started.swap(true, Ordering::SeqCst) {
            let program = next
                .program
                .lock()
                .unwrap()
                .take()
                .expect("context has no program");
            let baton = next.clone();
            thread::spawn(move || {
                let cpu = baton.wait();
                CPU.with(|c| c.set(cpu));
                program();
            });
        }

        next.post(cpu);
        let cpu = me.wait();
        CPU.with(|c| c.set(cpu));
    }

    fn alloc_kstack(&self) -> Option<SimKernelStack> {
        self.kstacks.fetch_add(1, Ordering::SeqCst);
        Some(SimKernelStack {
            baton: Baton::new(false),
            live: self.kstacks.clone(),
        })
    }

    fn new_context(&self, kstack: &SimKernelStack) -> SimContext {
        SimContext {
            baton: kstack.baton.clone(),
        }
    }

    fn init_trap_frame(&self, kstack: &mut SimKernelStack) {
        *kstack.baton.program.lock().unwrap() = Some(Self::take_pending());
    }

    fn copy_trap_frame(&self, _parent: &SimKernelStack, child: &mut SimKernelStack) {
        *child.baton.program.lock().unwrap() = Some(Self::take_pending());
    }

    fn create_init_space(&self) -> Option<SimSpace> {
        Some(SimSpace {
            size: INIT_SPACE_SIZE,
        })
    }

    fn copy_space(&self, src: &SimSpace) -> Option<SimSpace> {
        if self.fail_copy_space.load(Ordering::SeqCst) {
            return None;
        }
        Some(SimSpace { size: src.size })
    }

    fn resize_space(&self, space: &mut SimSpace, delta: isize) -> Option<usize> {
        let size = space.size.checked_add_signed(delta)?;
        space.size = size;
        Some(size)
    }

    fn space_size(&self, space: &SimSpace) -> usize {
        space.size
    }

    fn activate_space(&self, _space: Option<&SimSpace>) {}

    fn root_fs(&self) -> SimFs {
        self.fs_refs.fetch_add(1, Ordering::SeqCst);
        SimFs {
            open: self.fs_refs.clone(),
        }
    }

    fn dup_fs(&self, fs: &SimFs) -> SimFs {
        fs.open.fetch_add(1, Ordering::SeqCst);
        SimFs {
            open: fs.open.clone(),
        }
    }
}

fn run_process<F: FnOnce(&Arc<Kernel>)>(k: Arc<Kernel>, body: F) {
    k.fork_return();
    body(&k);
    k.exit()
}

fn run_init<F: FnOnce(&Arc<Kernel>)>(k: Arc<Kernel>, body: F) {
    k.fork_return();
    body(&k);
    while k.wait().is_ok() {}
    park(&k)
}

fn run_cpu(pm: Arc<Kernel>, cpu: usize) {
    CPU.with(|c| c.set(cpu));
    pm.scheduler()
}

/// Boot a kernel with `ncpu` scheduler threads. `init` runs as the first
/// process; afterwards init keeps reaping children and then parks.
pub fn boot<F>(policy: SchedulingPolicy, ncpu: usize, init: F) -> Arc<Kernel>
where
    F: FnOnce(&Arc<Kernel>) + Send + 'static,
{
    assert!(ncpu < NCPU, "the last CPU belongs to the test thread");
    let pm = Arc::new(ProcessManager::new(SimPlatform::new(), policy));

    let k = pm.clone();
    let init_body: Program = Box::new(move || run_init(k, init));
    PENDING.with(|p| *p.borrow_mut() = Some(init_body));
    pm.user_init();

    for cpu in 0..ncpu {
        let pm = pm.clone();
        thread::spawn(move || run_cpu(pm, cpu));
    }
    pm
}

/// Fork the calling process; the child runs `body` and exits.
pub fn spawn<F>(k: &Arc<Kernel>, body: F) -> Result<Pid, ProcError>
where
    F: FnOnce(&Arc<Kernel>) + Send + 'static,
{
    let kernel = k.clone();
    let program: Program = Box::new(move || run_process(kernel, body));
    PENDING.with(|p| *p.borrow_mut() = Some(program));
    let result = k.fork();
    PENDING.with(|p| p.borrow_mut().take());
    result
}

/// Sleep on a channel nobody wakes.
pub fn park(k: &Kernel) -> ! {
    let lock = SpinLock::new(());
    let mut guard = k.acquire(&lock);
    loop {
        guard = k.sleep(Channel::of(&lock), guard);
    }
}

/// Sleep on a private channel until killed.
pub fn park_until_killed(k: &Kernel) {
    let lock = SpinLock::new(());
    let mut guard = k.acquire(&lock);
    while !k.current_killed() {
        guard = k.sleep(Channel::of(&lock), guard);
    }
}

#[derive(Default)]
struct GateState {
    arrived: usize,
    open: bool,
}

/// Start line for a group of processes, built on kernel sleep/wakeup.
#[derive(Default)]
pub struct Gate {
    state: SpinLock<GateState>,
    arrived: u8,
    opened: u8,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn arrive_and_wait(&self, k: &Kernel) {
        let mut state = k.acquire(&self.state);
        state.arrived += 1;
        k.wakeup(Channel::of(&self.arrived));
        while !state.open {
            state = k.sleep(Channel::of(&self.opened), state);
        }
    }

    pub fn wait_arrivals(&self, k: &Kernel, n: usize) {
        let mut state = k.acquire(&self.state);
        while state.arrived < n {
            state = k.sleep(Channel::of(&self.arrived), state);
        }
    }

    pub fn open(&self, k: &Kernel) {
        k.acquire(&self.state).open = true;
        k.wakeup(Channel::of(&self.opened));
    }
}

/// Poll `cond` from the test thread until it holds or the timeout expires.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + TIMEOUT;
    while std::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}
