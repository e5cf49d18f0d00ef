//! Kernel logger: the `log` facade routed to the console, with a per-module
//! enable/disable table.

use core::{
    cell::UnsafeCell,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::{Mutex, Once};

use crate::console::{Console, init_console};

fn colored_str(level: Level) -> &'static str {
    match level {
        Level::Trace => "\x1b[90mTRACE\x1b[0m", // Grey
        Level::Debug => "\x1b[36mDEBUG\x1b[0m", // Cyan
        Level::Info => "\x1b[32mINFO\x1b[0m",   // Green
        Level::Warn => "\x1b[33mWARN\x1b[0m",   // Yellow
        Level::Error => "\x1b[31mERROR\x1b[0m", // Red
    }
}

/// Maximum number of module filters
const MAX_MODULE_FILTERS: usize = 32;
/// Longest module path a filter can hold
const MAX_NAME_LEN: usize = 48;

/// Module filter entry. The name is written once, before the entry is
/// published by bumping `ModuleFilters::count`.
struct ModuleFilter {
    name: UnsafeCell<[u8; MAX_NAME_LEN]>,
    name_len: UnsafeCell<usize>,
    enabled: AtomicBool,
}

impl ModuleFilter {
    const fn new() -> Self {
        Self {
            name: UnsafeCell::new([0; MAX_NAME_LEN]),
            name_len: UnsafeCell::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    fn matches(&self, module: &str) -> bool {
        // 已发布的条目名字不再改变
        let name = unsafe { &(&(*self.name.get()))[..*self.name_len.get()] };
        !name.is_empty() && name == module.as_bytes()
    }
}

/// Which modules may log. Modules without an entry follow `default_enabled`.
///
/// Lookups take no lock, so a log call from an interrupt handler never waits
/// on the code it interrupted. Updates are serialized by `writer`.
pub struct ModuleFilters {
    filters: [ModuleFilter; MAX_MODULE_FILTERS],
    count: AtomicUsize,
    default_enabled: AtomicBool,
    writer: Mutex<()>,
}

unsafe impl Sync for ModuleFilters {}

impl ModuleFilters {
    pub const fn new() -> Self {
        Self {
            filters: [const { ModuleFilter::new() }; MAX_MODULE_FILTERS],
            count: AtomicUsize::new(0),
            default_enabled: AtomicBool::new(true),
            writer: Mutex::new(()),
        }
    }

    fn published(&self) -> &[ModuleFilter] {
        &self.filters[..self.count.load(Ordering::Acquire)]
    }

    pub fn set_default_enabled(&self, enabled: bool) {
        self.default_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Returns false when the table is full or the name too long.
    pub fn set(&self, module: &str, enabled: bool) -> bool {
        let _writer = self.writer.lock();
        if let Some(filter) = self.published().iter().find(|f| f.matches(module)) {
            filter.enabled.store(enabled, Ordering::Relaxed);
            return true;
        }

        let count = self.count.load(Ordering::Relaxed);
        let bytes = module.as_bytes();
        if count == MAX_MODULE_FILTERS || bytes.len() > MAX_NAME_LEN {
            return false;
        }
        let filter = &self.filters[count];
        // 未发布的条目只有持有 writer 的一方能碰
        unsafe {
            (&mut (*filter.name.get()))[..bytes.len()].copy_from_slice(bytes);
            *filter.name_len.get() = bytes.len();
        }
        filter.enabled.store(enabled, Ordering::Relaxed);
        self.count.store(count + 1, Ordering::Release);
        true
    }

    pub fn is_enabled(&self, module: &str) -> bool {
        self.published()
            .iter()
            .find(|f| f.matches(module))
            .map_or(self.default_enabled.load(Ordering::Relaxed), |f| {
                f.enabled.load(Ordering::Relaxed)
            })
    }

    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ModuleFilters {
    fn default() -> Self {
        Self::new()
    }
}

static FILTERS: ModuleFilters = ModuleFilters::new();
static HART_ID: Once<fn() -> usize> = Once::new();

struct Logger;

static LOGGER: Logger = Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && FILTERS.is_enabled(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let hart_id = HART_ID.get().map_or(0, |f| f());
        println!(
            "[\x1b[35mCPU-{}\x1b[0m] [{}] [\x1b[34m{}\x1b[0m] {}",
            hart_id,
            colored_str(record.level()),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Install the kernel logger. `hart_id` tags every line with the CPU it came from.
pub fn init(
    console: &'static dyn Console,
    level: LevelFilter,
    hart_id: fn() -> usize,
) -> Result<(), SetLoggerError> {
    init_console(console);
    HART_ID.call_once(|| hart_id);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

pub fn set_log_level(level: LevelFilter) {
    log::set_max_level(level);
}

/// Set the default enabled state for modules not in filter list
pub fn set_default_module_enabled(enabled: bool) {
    FILTERS.set_default_enabled(enabled);
}

/// Enable logging for a specific module path, e.g. `kproc::task::lifecycle`.
pub fn enable_module(module: &str) -> bool {
    FILTERS.set(module, true)
}

pub fn disable_module(module: &str) -> bool {
    FILTERS.set(module, false)
}
