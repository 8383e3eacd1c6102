//! 定义 PulseLog 日志运行时的所有配置结构体。
//!
//! 配置可以在代码中构造，也可以通过 [`load_config_from_file`] 从
//! TOML 文件加载。所有字段都有默认值，且可以在运行期通过各 sink
//! 的线程安全 setter 更新（读者总是看到最新提交的快照）。

use crate::core::event::LogLevel;
use crate::error::{PulseLogError, Result};
use crate::sinks::batching::BatchConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// --- 辅助函数，用于提供配置项的默认值 ---
fn default_min_level() -> String {
    "INFO".to_string()
}
fn default_true() -> bool {
    true
}
fn default_queue_capacity() -> usize {
    1000
}
fn default_max_file_size_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_file_batch_size() -> usize {
    100
}
fn default_file_flush_interval_ms() -> u64 {
    500
}
fn default_network_batch_size() -> usize {
    50
}
fn default_network_flush_interval_ms() -> u64 {
    2000
}

/// PulseLog 日志运行时的顶层配置结构体。
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PulseLogConfig {
    /// 全局最小级别，低于该级别的调用立即返回
    #[serde(default = "default_min_level")]
    pub min_level: String,
    /// 控制台直通 sink
    pub console: Option<ConsoleConfig>,
    /// 文件 sink
    pub file: Option<FileSinkConfig>,
    /// 网络 sink
    pub network: Option<NetworkSinkConfig>,
}

impl Default for PulseLogConfig {
    fn default() -> Self {
        Self {
            min_level: default_min_level(),
            console: None,
            file: None,
            network: None,
        }
    }
}

impl PulseLogConfig {
    /// 解析配置中的最小级别字符串。
    pub fn min_level(&self) -> Result<LogLevel> {
        self.min_level.parse()
    }
}

/// 控制台直通 sink 配置。
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

/// 文件 sink 配置。
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileSinkConfig {
    /// 目标文件路径；缺省时从当前可执行文件名推导
    pub path: Option<PathBuf>,
    /// 触发轮转的文件大小上限（字节）
    #[serde(default = "default_max_file_size_bytes")]
    pub max_size_bytes: u64,
    /// 批大小触发阈值
    #[serde(default = "default_file_batch_size")]
    pub batch_size: usize,
    /// 时间触发阈值（毫秒）
    #[serde(default = "default_file_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// 有界队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_size_bytes: default_max_file_size_bytes(),
            batch_size: default_file_batch_size(),
            flush_interval_ms: default_file_flush_interval_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl FileSinkConfig {
    /// 对应的批处理引擎参数。
    pub fn batch(&self) -> BatchConfig {
        BatchConfig {
            queue_capacity: self.queue_capacity,
            batch_size: self.batch_size,
            flush_interval: Duration::from_millis(self.flush_interval_ms),
        }
    }
}

/// 网络 sink 配置。
///
/// `url` 缺省时 sink 处于禁用状态：批次写入变为空操作，连接校验
/// 返回失败并说明未配置。
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct NetworkSinkConfig {
    /// 日志服务器基地址，例如 `http://localhost:5341`
    pub url: Option<String>,
    /// API key，配置后随每个请求发送
    pub api_key: Option<String>,
    /// 静态来源标签，写入每个 CLEF 事件的 `Source` 字段
    pub source: Option<String>,
    /// 静态实例标签，写入每个 CLEF 事件的 `Instance` 字段
    pub instance: Option<String>,
    /// 批大小触发阈值
    #[serde(default = "default_network_batch_size")]
    pub batch_size: usize,
    /// 时间触发阈值（毫秒）
    #[serde(default = "default_network_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// 有界队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl NetworkSinkConfig {
    /// 对应的批处理引擎参数。
    pub fn batch(&self) -> BatchConfig {
        BatchConfig {
            queue_capacity: if self.queue_capacity == 0 {
                default_queue_capacity()
            } else {
                self.queue_capacity
            },
            batch_size: if self.batch_size == 0 {
                default_network_batch_size()
            } else {
                self.batch_size
            },
            flush_interval: Duration::from_millis(if self.flush_interval_ms == 0 {
                default_network_flush_interval_ms()
            } else {
                self.flush_interval_ms
            }),
        }
    }

    /// 用本机主机名填充缺省的 `Instance` 标签。
    pub fn with_host_instance(mut self) -> Self {
        if self.instance.is_none() {
            self.instance = hostname::get()
                .ok()
                .and_then(|name| name.into_string().ok());
        }
        self
    }
}

/// 从 TOML 文件加载配置。
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<PulseLogConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PulseLogError::ConfigFileMissing(
            path.display().to_string(),
        ));
    }

    let content = std::fs::read_to_string(path)?;
    let config: PulseLogConfig = toml::from_str(&content)?;
    Ok(config)
}
