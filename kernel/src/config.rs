use log::LevelFilter;

use crate::task::SchedulingPolicy;

// 日志配置
#[cfg(debug_assertions)]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// 进程表槽位数
pub const NPROC: usize = 64;
/// 最大 CPU 数
pub const NCPU: usize = 8;
/// 进程名最大长度（含结尾的 0）
pub const PROC_NAME_LEN: usize = 16;

pub const DEFAULT_TICKETS: u32 = 1;
pub const DEFAULT_PRIORITY: u32 = 50;
/// 数值越小优先级越高
pub const MIN_PRIORITY: u32 = 0;
pub const MAX_PRIORITY: u32 = 200;

/// Base seed of the per-CPU lottery generators, mixed with the hart id.
pub const LOTTERY_SEED: u64 = 0x2545_f491_4f6c_dd1d;

#[cfg(feature = "lottery")]
pub const DEFAULT_SCHEDULING_POLICY: SchedulingPolicy = SchedulingPolicy::Lottery;

#[cfg(not(feature = "lottery"))]
pub const DEFAULT_SCHEDULING_POLICY: SchedulingPolicy = SchedulingPolicy::Priority;
