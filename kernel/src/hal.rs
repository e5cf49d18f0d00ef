//! The hardware/platform seam.
//!
//! The process core never touches registers, page tables or files itself. A
//! port (the riscv kernel, or the host simulator used by the tests) supplies
//! one `Platform` implementation. Resources are owned values: dropping a
//! `KernelStack`, `AddressSpace` or `FsContext` releases it.

/// Collaborators consumed by the process core.
pub trait Platform: Send + Sync + 'static {
    /// Saved callee-saved register state of a kernel thread.
    type Context: Default + Send;
    /// A process's kernel stack, including its trap frame.
    type KernelStack: Send;
    /// A user address space (page table plus mapped memory).
    type AddressSpace: Send;
    /// Open-file table and working directory of a process.
    type FsContext: Send;

    /// Id of the CPU executing the caller. Only stable while interrupts are off.
    fn cpu_id(&self) -> usize;

    fn intr_get(&self) -> bool;
    fn intr_on(&self);
    fn intr_off(&self);

    /// Called by an idle scheduler loop; a real port executes `wfi` here.
    fn wait_for_interrupt(&self) {
        core::hint::spin_loop();
    }

    /// Save the running context into `save` and resume `load`. Returns when
    /// something switches back to `save`.
    ///
    /// # Safety
    /// Both pointers must stay valid until the switch back, and interrupts
    /// must be disabled.
    unsafe fn switch(&self, save: *mut Self::Context, load: *const Self::Context);

    fn alloc_kstack(&self) -> Option<Self::KernelStack>;

    /// A fresh context that starts in the fork-return path on `kstack`.
    fn new_context(&self, kstack: &Self::KernelStack) -> Self::Context;

    /// Trap frame of the first process: enter user mode at address 0.
    fn init_trap_frame(&self, kstack: &mut Self::KernelStack);

    /// Copy `parent`'s trap frame into `child` and clear the child's return
    /// value register, so fork returns 0 there.
    fn copy_trap_frame(&self, parent: &Self::KernelStack, child: &mut Self::KernelStack);

    /// Address space of the first process, with the init code loaded.
    fn create_init_space(&self) -> Option<Self::AddressSpace>;

    fn copy_space(&self, src: &Self::AddressSpace) -> Option<Self::AddressSpace>;

    /// Grow (or shrink for negative `delta`) the space. Returns the new size.
    fn resize_space(&self, space: &mut Self::AddressSpace, delta: isize) -> Option<usize>;

    fn space_size(&self, space: &Self::AddressSpace) -> usize;

    /// Install `space` on this CPU, or the kernel-only space for `None`.
    fn activate_space(&self, space: Option<&Self::AddressSpace>);

    /// File state of the first process (no open files, cwd at `/`).
    fn root_fs(&self) -> Self::FsContext;

    /// Duplicate open-file references and the cwd reference for a child.
    fn dup_fs(&self, fs: &Self::FsContext) -> Self::FsContext;
}
