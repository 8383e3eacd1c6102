//! 控制台 Sink
//!
//! 直通的标准错误输出：不经过批处理引擎，条目在分发线程上同步
//! 格式化并写出。主要用于开发期和早期启动阶段，在文件与网络
//! sink 就绪之前提供可见性。

use crate::core::event::LogEntry;
use crate::sinks::traits::Sink;
use async_trait::async_trait;
use std::io::Write;

/// 控制台 Sink
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    async fn log(&self, entry: LogEntry) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        // stderr 不可写时没有可回报的去处，静默丢弃
        let _ = writeln!(handle, "{}", entry.to_line());
        if let Some(detail) = entry.detail_line() {
            let _ = writeln!(handle, "{}", detail);
        }
    }

    async fn shutdown(&self) {}

    fn name(&self) -> &'static str {
        "console"
    }
}
