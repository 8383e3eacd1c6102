//! 定义 PulseLog 日志运行时的内部诊断与指标。
//!
//! 此模块提供了对批处理管道健康状况的可观测性：提交、丢弃、
//! 批量刷新与文件轮转的计数都汇总在一个进程级实例中。

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static GLOBAL_DIAGNOSTICS: Lazy<Diagnostics> = Lazy::new(Diagnostics::new);

/// 获取进程级诊断实例。
pub fn global() -> &'static Diagnostics {
    &GLOBAL_DIAGNOSTICS
}

/// 内部诊断与指标数据结构。
///
/// 使用原子操作确保线程安全，提供日志系统运行时的关键指标。
#[derive(Debug)]
pub struct Diagnostics {
    /// 系统启动时间
    start_time: Instant,

    /// 已提交到批处理队列的日志条目总数
    entries_submitted: AtomicU64,

    /// 停机开始后被丢弃的日志条目数
    entries_dropped_shutdown: AtomicU64,

    /// 成功刷新的批次数
    batches_flushed: AtomicU64,

    /// 刷新失败的批次数（批次仍被清空，至多一次投递）
    flush_errors: AtomicU64,

    /// 文件轮转次数
    file_rotations: AtomicU64,
}

/// 诊断数据的快照，用于外部查询。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    /// 系统运行时间
    pub uptime: Duration,

    /// 已提交到批处理队列的日志条目总数
    pub entries_submitted: u64,

    /// 停机开始后被丢弃的日志条目数
    pub entries_dropped_shutdown: u64,

    /// 成功刷新的批次数
    pub batches_flushed: u64,

    /// 刷新失败的批次数
    pub flush_errors: u64,

    /// 文件轮转次数
    pub file_rotations: u64,
}

impl Diagnostics {
    /// 创建新的诊断实例。
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            entries_submitted: AtomicU64::new(0),
            entries_dropped_shutdown: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            flush_errors: AtomicU64::new(0),
            file_rotations: AtomicU64::new(0),
        }
    }

    /// 增加已提交条目计数。
    pub fn increment_entries_submitted(&self) {
        self.entries_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加停机后丢弃的条目计数。
    pub fn increment_entries_dropped_shutdown(&self) {
        self.entries_dropped_shutdown.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加成功刷新的批次计数。
    pub fn increment_batches_flushed(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加刷新失败计数。
    pub fn increment_flush_errors(&self) {
        self.flush_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加文件轮转计数。
    pub fn increment_file_rotations(&self) {
        self.file_rotations.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取诊断数据的快照。
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            uptime: self.start_time.elapsed(),
            entries_submitted: self.entries_submitted.load(Ordering::Relaxed),
            entries_dropped_shutdown: self.entries_dropped_shutdown.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            flush_errors: self.flush_errors.load(Ordering::Relaxed),
            file_rotations: self.file_rotations.load(Ordering::Relaxed),
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let diagnostics = Diagnostics::new();

        diagnostics.increment_entries_submitted();
        diagnostics.increment_entries_submitted();
        diagnostics.increment_batches_flushed();
        diagnostics.increment_flush_errors();
        diagnostics.increment_file_rotations();
        diagnostics.increment_entries_dropped_shutdown();

        let snapshot = diagnostics.snapshot();
        assert_eq!(snapshot.entries_submitted, 2);
        assert_eq!(snapshot.batches_flushed, 1);
        assert_eq!(snapshot.flush_errors, 1);
        assert_eq!(snapshot.file_rotations, 1);
        assert_eq!(snapshot.entries_dropped_shutdown, 1);
    }

    #[test]
    fn test_global_instance_is_shared() {
        // 其他并行测试也会增加全局计数，只检查单调性
        let before = global().snapshot().entries_submitted;
        global().increment_entries_submitted();
        let after = global().snapshot().entries_submitted;
        assert!(after >= before + 1);
    }
}
