//! Multi-core synchronization primitives
//!
//! The process table lock, the ticks lock and the condition locks handed to
//! `sleep` are all `SpinLock`s, taken through `ProcessManager::acquire` so
//! that interrupts stay off on the holding CPU.

pub mod spinlock;

pub use spinlock::{SpinLock, SpinLockGuard};
