//! PulseLog Sink Traits
//!
//! 定义了统一的 Sink trait 接口，所有日志输出目标（文件、网络、
//! 控制台）都实现这一能力。
//!
//! # 架构设计
//!
//! - `Sink`: 对象安全的核心接口，`log` 对调用方永不可观测地失败
//! - `SinkError` / `SinkResult`: sink 内部写路径使用的错误类型，
//!   由各 sink 自行吞掉，绝不上抛到分发器或原始调用方

use crate::core::event::LogEntry;
use async_trait::async_trait;
use std::fmt::Debug;

/// 基础 Sink trait
///
/// 定义了所有日志输出目标必须实现的核心接口。`log` 返回 `()`：
/// sink 内部的任何失败都由 sink 自己的错误策略消化，调用方
/// 观察不到。对于基于批处理引擎的 sink，`log` 只是一次入队，
/// 队列满时产生背压（调用方挂起），停机开始后条目被静默丢弃。
#[async_trait]
pub trait Sink: Send + Sync + Debug {
    /// 接收一条日志条目。
    ///
    /// 永不向调用方抛出错误；队列满时阻塞（背压）。
    async fn log(&self, entry: LogEntry);

    /// 优雅关闭 sink。
    ///
    /// 基于批处理引擎的 sink 在此排空队列并执行最后一次刷新。
    /// 幂等：重复调用是无害的空操作。
    async fn shutdown(&self);

    /// 获取 sink 的名称，用于日志和调试目的。
    fn name(&self) -> &'static str;
}

/// 通用 Sink 错误类型
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O 错误
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 网络错误
    #[error("Network error: {0}")]
    Network(String),

    /// Sink 已关闭
    #[error("Sink is closed")]
    Closed,

    /// 通用错误
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Sink 结果类型
pub type SinkResult<T> = Result<T, SinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_display() {
        let io_error = SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "Permission denied",
        ));
        assert!(io_error.to_string().contains("I/O error"));

        let config_error = SinkError::Config("missing path".to_string());
        assert!(config_error.to_string().contains("Configuration error"));

        let network_error = SinkError::Network("connection refused".to_string());
        assert!(network_error.to_string().contains("Network error"));

        assert!(SinkError::Closed.to_string().contains("closed"));
    }
}
