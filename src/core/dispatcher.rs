//! 日志分发器
//!
//! 管道的入口：持有已注册 sink 的有序集合和一个全局最小级别。
//! 低于最小级别的调用在捕获时间戳之前立即返回；通过过滤的调用
//! 构造一条不可变条目，并按注册顺序同步扇出到每个 sink。
//!
//! “同步”指分发器本身不排队：`log` 返回时，每个 sink 的 `log`
//! 已经完成。对批处理 sink 这只是一次入队；直通 sink 则已写出。

use crate::core::event::{LogEntry, LogLevel};
use crate::sinks::traits::Sink;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// 日志分发器
#[derive(Debug)]
pub struct Dispatcher {
    /// 全局最小级别的紧凑表示
    min_level: AtomicU8,
    /// 已注册的 sink，按注册顺序保存
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
}

impl Dispatcher {
    /// 创建空的分发器，最小级别为 `Info`。
    pub fn new() -> Self {
        Self {
            min_level: AtomicU8::new(LogLevel::default().to_u8()),
            sinks: RwLock::new(Vec::new()),
        }
    }

    /// 当前的全局最小级别。
    pub fn min_level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Acquire))
    }

    /// 更新全局最小级别，对后续调用立即生效。
    ///
    /// 已在队列中的条目不受影响：过滤只发生在提交点。
    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level.to_u8(), Ordering::Release);
    }

    /// 注册一个 sink。幂等：同一个 sink 实例重复注册只保留一份。
    pub async fn register_sink(&self, sink: Arc<dyn Sink>) {
        let mut sinks = self.sinks.write().await;
        if sinks.iter().any(|existing| Arc::ptr_eq(existing, &sink)) {
            return;
        }
        tracing::debug!("Registered sink: {}", sink.name());
        sinks.push(sink);
    }

    /// 注销一个 sink。不存在时为无害的空操作。
    ///
    /// 注销只是把 sink 移出分发集合，不会关闭它；调用方仍需对
    /// 自己持有的 sink 调用 `shutdown`。
    pub async fn unregister_sink(&self, sink: &Arc<dyn Sink>) {
        let mut sinks = self.sinks.write().await;
        if let Some(index) = sinks.iter().position(|existing| Arc::ptr_eq(existing, sink)) {
            let removed = sinks.remove(index);
            tracing::debug!("Unregistered sink: {}", removed.name());
        }
    }

    /// 当前注册的 sink 数量。
    pub async fn sink_count(&self) -> usize {
        self.sinks.read().await.len()
    }

    /// 提交一条日志。
    pub async fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_with_details(level, message, None).await;
    }

    /// 提交一条带附加详情的日志。
    ///
    /// 级别低于全局最小级别时立即返回，不分配、不捕获时间戳。
    pub async fn log_with_details(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<String>,
    ) {
        if level < self.min_level() {
            return;
        }

        let entry = LogEntry::new(level, message, details);

        // 持读锁扇出，注册顺序即投递顺序
        let sinks = self.sinks.read().await;
        for sink in sinks.iter() {
            sink.log(entry.clone()).await;
        }
    }

    pub async fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message).await;
    }

    pub async fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message).await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message).await;
    }

    pub async fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message).await;
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
