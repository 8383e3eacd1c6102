//! # PulseLog
//!
//! 面向宿主应用的结构化日志运行时：调用方提交级别化的日志条目，
//! 分发器把通过级别过滤的条目同步扇出到已注册的 sink，各 sink
//! 再通过共享的批处理引擎异步落盘或上报。
//!
//! ## 特性
//!
//! - **有序级别过滤**: `Trace < Debug < Info < Warn < Error`，
//!   低于全局最小级别的调用立即返回
//! - **批处理引擎**: 有界队列加单工作任务，按批大小或时间间隔
//!   双重触发刷新，停机时排空队列
//! - **文件 sink**: 单行文本格式，基于大小的轮转，毫秒级时间戳
//!   备份名，运行期改名
//! - **网络 sink**: CLEF（换行分隔 JSON）批量 HTTP 上报，带
//!   按状态码分类的连接校验探针
//! - **错误隔离**: sink 写路径的任何失败都不会传播到日志调用方
//!
//! ## 快速开始
//!
//! ```no_run
//! use pulse_log::{init_with_config, shutdown, PulseLogConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config: PulseLogConfig = toml::from_str(
//!         r#"
//!         min_level = "DEBUG"
//!
//!         [file]
//!         path = "app.log"
//!         "#,
//!     )?;
//!     init_with_config(config).await?;
//!
//!     pulse_log::global().info("application started").await;
//!
//!     shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod sinks;
pub mod utils;

pub use config::{
    load_config_from_file, ConsoleConfig, FileSinkConfig, NetworkSinkConfig, PulseLogConfig,
};
pub use core::{Dispatcher, LogEntry, LogLevel};
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};
pub use error::{PulseLogError, Result};
pub use sinks::{ConsoleSink, FileSink, NetworkSink, Sink};

use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static GLOBAL_DISPATCHER: Lazy<Dispatcher> = Lazy::new(Dispatcher::new);

/// 由 [`init_with_config`] 安装的 sink，留待 [`shutdown`] 关闭。
static INSTALLED_SINKS: Lazy<Mutex<Vec<Arc<dyn Sink>>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// 获取进程级分发器。
///
/// 未经初始化也可使用：此时没有注册任何 sink，日志调用在级别
/// 过滤后被丢弃。
pub fn global() -> &'static Dispatcher {
    &GLOBAL_DISPATCHER
}

/// 按配置初始化进程级分发器。
///
/// 为配置中启用的每个 sink 创建实例并注册到全局分发器。重复
/// 调用会在已有 sink 之外追加新的一组；通常应当只调用一次，
/// 并在进程退出前配对调用 [`shutdown`]。
pub async fn init_with_config(config: PulseLogConfig) -> Result<()> {
    let dispatcher = global();
    dispatcher.set_min_level(config.min_level()?);

    let mut installed: Vec<Arc<dyn Sink>> = Vec::new();

    if let Some(console) = config.console {
        if console.enabled {
            installed.push(Arc::new(ConsoleSink::new()));
        }
    }
    if let Some(file) = config.file {
        installed.push(Arc::new(FileSink::new(file)?));
    }
    if let Some(network) = config.network {
        installed.push(Arc::new(NetworkSink::new(network.with_host_instance())?));
    }

    for sink in &installed {
        dispatcher.register_sink(sink.clone()).await;
    }
    INSTALLED_SINKS.lock().await.extend(installed);

    tracing::info!("PulseLog {} initialized", VERSION);
    Ok(())
}

/// 从 TOML 文件加载配置并初始化。
pub async fn init_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<()> {
    let config = load_config_from_file(path)?;
    init_with_config(config).await
}

/// 优雅关闭进程级日志系统。
///
/// 先把已安装的 sink 移出分发集合（新条目不再进入），再逐个
/// 排空并关闭。幂等：没有已安装 sink 时是空操作。
pub async fn shutdown() {
    let installed: Vec<Arc<dyn Sink>> = INSTALLED_SINKS.lock().await.drain(..).collect();
    let dispatcher = global();

    for sink in &installed {
        dispatcher.unregister_sink(sink).await;
    }
    for sink in &installed {
        sink.shutdown().await;
    }

    if !installed.is_empty() {
        tracing::info!("PulseLog shut down ({} sinks drained)", installed.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_and_shutdown_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("global.log");

        let config = PulseLogConfig {
            min_level: "DEBUG".to_string(),
            console: None,
            file: Some(FileSinkConfig {
                path: Some(log_path.clone()),
                batch_size: 1,
                ..Default::default()
            }),
            network: None,
        };

        init_with_config(config).await.unwrap();
        global().debug("visible after init").await;
        shutdown().await;

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("visible after init"));

        // 关闭后全局分发器仍可调用，但条目无处可去
        assert_eq!(global().sink_count().await, 0);
        global().info("goes nowhere").await;
    }

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
