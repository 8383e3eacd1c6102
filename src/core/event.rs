//! PulseLog 日志条目定义
//!
//! 此模块定义了贯穿整个管道的不可变值类型：有序的日志级别与
//! 在调用点捕获的日志条目。时间戳和线程 ID 在构造时确定，
//! 之后不再变化，即使条目在队列中等待刷新。

use crate::utils::current_thread_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 日志级别
///
/// 全序枚举，用于最小级别过滤：`Trace < Debug < Info < Warn < Error`。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// 最详细的级别
    Trace,
    /// 调试信息
    Debug,
    /// 常规信息（默认级别）
    #[default]
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 所有级别，按严重程度升序排列。
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// 级别的大写名称，用于文件行格式。
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// CLEF（Compact Log Event Format）线协议使用的级别名称。
    pub fn clef_name(&self) -> &'static str {
        match self {
            LogLevel::Trace => "Verbose",
            LogLevel::Debug => "Debug",
            LogLevel::Info => "Information",
            LogLevel::Warn => "Warning",
            LogLevel::Error => "Error",
        }
    }

    /// 用于原子存储的紧凑表示。
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            LogLevel::Trace => 0,
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Error => 4,
        }
    }

    /// 从紧凑表示恢复级别。越界值按 `Error` 处理。
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = crate::error::PulseLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(crate::error::PulseLogError::InvalidLogLevel(
                other.to_string(),
            )),
        }
    }
}

/// 日志条目
///
/// 包含一次日志调用的全部信息。构造后不可变；时间戳与线程 ID
/// 反映产生日志的调用方，而非批处理工作线程。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 捕获时刻（UTC）
    pub timestamp: DateTime<Utc>,
    /// 日志级别
    pub level: LogLevel,
    /// 日志消息
    pub message: String,
    /// 可选的附加详情
    pub details: Option<String>,
    /// 产生此条目的操作系统线程 ID
    pub thread_id: u64,
}

impl LogEntry {
    /// 在调用点创建新的日志条目。
    pub fn new(level: LogLevel, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            details: details.filter(|d| !d.is_empty()),
            thread_id: current_thread_id(),
        }
    }

    /// 文本行表示：`[yyyy-mm-dd hh:nn:ss.zzz] [LEVEL] [Thread:id] message`。
    pub fn to_line(&self) -> String {
        format!(
            "[{}] [{}] [Thread:{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level,
            self.thread_id,
            self.message
        )
    }

    /// 详情的伴随行，固定使用 `TRACE` 伪级别；无详情时返回 `None`。
    pub fn detail_line(&self) -> Option<String> {
        self.details.as_ref().map(|details| {
            format!(
                "[{}] [TRACE] [Thread:{}] {}",
                self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                self.thread_id,
                details
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_level_round_trip_u8() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_u8(level.to_u8()), level);
        }
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose-ish".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_clef_level_mapping() {
        assert_eq!(LogLevel::Trace.clef_name(), "Verbose");
        assert_eq!(LogLevel::Debug.clef_name(), "Debug");
        assert_eq!(LogLevel::Info.clef_name(), "Information");
        assert_eq!(LogLevel::Warn.clef_name(), "Warning");
        assert_eq!(LogLevel::Error.clef_name(), "Error");
    }

    #[test]
    fn test_entry_captures_calling_thread() {
        let entry = LogEntry::new(LogLevel::Info, "hello", None);
        assert_eq!(entry.thread_id, current_thread_id());

        let other = std::thread::spawn(|| LogEntry::new(LogLevel::Info, "other", None))
            .join()
            .unwrap();
        assert_ne!(other.thread_id, entry.thread_id);
    }

    #[test]
    fn test_line_format() {
        let entry = LogEntry::new(LogLevel::Warn, "disk almost full", None);
        let line = entry.to_line();
        assert!(line.contains("[WARN]"));
        assert!(line.contains(&format!("[Thread:{}]", entry.thread_id)));
        assert!(line.ends_with("disk almost full"));
        assert!(entry.detail_line().is_none());
    }

    #[test]
    fn test_detail_line_uses_trace_pseudo_level() {
        let entry = LogEntry::new(
            LogLevel::Error,
            "request failed",
            Some("stack: frame a / frame b".to_string()),
        );
        let detail = entry.detail_line().unwrap();
        assert!(detail.contains("[TRACE]"));
        assert!(detail.ends_with("stack: frame a / frame b"));
    }

    #[test]
    fn test_empty_details_are_dropped() {
        let entry = LogEntry::new(LogLevel::Info, "msg", Some(String::new()));
        assert!(entry.details.is_none());
    }
}
