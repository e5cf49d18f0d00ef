use core::fmt;

/// Recoverable failures of the process core.
///
/// Broken invariants are not represented here; they panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcError {
    /// No free process slot, or the platform could not provide a kernel
    /// stack or an address space.
    ResourceExhausted,
    /// Ticket count below 1, priority outside [0, 200], missing snapshot
    /// destination or unknown pid.
    InvalidArgument,
    /// `wait` called by a process without children.
    NoChildren,
    /// The caller was killed while blocked.
    Interrupted,
    /// The operation needs a current process but the CPU is running none.
    NoProcess,
}

impl fmt::Display for ProcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ProcError::ResourceExhausted => "out of process resources",
            ProcError::InvalidArgument => "invalid argument",
            ProcError::NoChildren => "no children",
            ProcError::Interrupted => "interrupted by kill",
            ProcError::NoProcess => "no current process",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for ProcError {}
