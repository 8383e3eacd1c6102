//! 文件 Sink
//!
//! 构建在批处理引擎之上的文本文件输出：条目被格式化为单行文本，
//! 整个批次以一次追加写入落盘。写入前执行基于大小的轮转检查，
//! 备份文件名内嵌毫秒级时间戳，同一毫秒内的再次轮转通过递增的
//! 数字后缀消解冲突。
//!
//! 该 sink 的全部文件 I/O 都在一把互斥锁下串行化，轮转、写入和
//! 运行期改名不会跨线程交错。所有 I/O 错误都被捕获并丢弃，
//! 日志记录绝不拖垮宿主应用。

use crate::config::FileSinkConfig;
use crate::core::event::LogEntry;
use crate::diagnostics;
use crate::sinks::batching::{BatchWriter, BatchingEngine};
use crate::sinks::traits::{Sink, SinkResult};
use crate::utils::current_thread_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// 文件 sink 的受锁可变状态。
#[derive(Debug)]
struct FileState {
    /// 当前活动文件路径
    path: PathBuf,
    /// 触发轮转的大小阈值（字节）
    max_size_bytes: u64,
}

/// 文件 Sink
#[derive(Debug)]
pub struct FileSink {
    engine: BatchingEngine,
    state: Arc<Mutex<FileState>>,
}

impl FileSink {
    /// 创建文件 sink 并启动其批处理工作任务。
    ///
    /// 目标路径缺省时从当前可执行文件名推导；父目录在首次写入
    /// 之前创建。
    pub fn new(config: FileSinkConfig) -> crate::error::Result<Self> {
        let path = config.path.clone().unwrap_or_else(default_log_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let state = Arc::new(Mutex::new(FileState {
            path,
            max_size_bytes: config.max_size_bytes,
        }));

        let writer = FileBatchWriter {
            state: state.clone(),
        };
        let engine = BatchingEngine::spawn(writer, config.batch(), "file");

        Ok(Self { engine, state })
    }

    /// 当前活动文件路径。
    pub async fn current_path(&self) -> PathBuf {
        self.state.lock().await.path.clone()
    }

    /// 更新轮转阈值，下一次写入即生效。
    pub async fn set_max_size(&self, max_size_bytes: u64) {
        self.state.lock().await.max_size_bytes = max_size_bytes;
    }

    /// 运行期改名：把活动文件目标换到新路径。
    ///
    /// 旧路径上已有文件时尝试将其移动到新路径以保留历史；移动
    /// 失败（跨设备、权限）则在新路径上重新开始，并把一条说明
    /// 失败原因（含旧路径）的警告行写进新文件。本方法永不向
    /// 调用方报错。
    pub async fn set_path(&self, new_path: PathBuf) {
        let mut state = self.state.lock().await;
        if state.path == new_path {
            return;
        }

        if let Some(parent) = new_path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = tokio::fs::create_dir_all(parent).await;
            }
        }

        if tokio::fs::try_exists(&state.path).await.unwrap_or(false) {
            if let Err(e) = tokio::fs::rename(&state.path, &new_path).await {
                tracing::warn!(
                    "Failed to move log file {} to {}: {}",
                    state.path.display(),
                    new_path.display(),
                    e
                );
                let warning = move_warning_line(&state.path, &e);
                if let Ok(mut file) = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&new_path)
                    .await
                {
                    let _ = file.write_all(format!("{}\n", warning).as_bytes()).await;
                }
            }
        }

        state.path = new_path;
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn log(&self, entry: LogEntry) {
        self.engine.log(entry).await;
    }

    async fn shutdown(&self) {
        self.engine.shutdown().await;
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// 文件批量写入器，由引擎工作任务驱动。
#[derive(Debug)]
struct FileBatchWriter {
    state: Arc<Mutex<FileState>>,
}

#[async_trait]
impl BatchWriter for FileBatchWriter {
    async fn write_batch(&mut self, entries: &[LogEntry]) -> SinkResult<()> {
        let state = self.state.lock().await;

        rotate_if_needed(&state.path, state.max_size_bytes).await?;

        let mut buffer = String::with_capacity(entries.len() * 96);
        for entry in entries {
            buffer.push_str(&entry.to_line());
            buffer.push('\n');
            if let Some(detail) = entry.detail_line() {
                buffer.push_str(&detail);
                buffer.push('\n');
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&state.path)
            .await?;
        file.write_all(buffer.as_bytes()).await?;

        Ok(())
    }
}

/// 写入前的轮转检查：文件大小达到阈值时重命名为带时间戳的备份。
async fn rotate_if_needed(path: &Path, max_size_bytes: u64) -> SinkResult<()> {
    let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
    if size < max_size_bytes {
        return Ok(());
    }

    let backup = next_backup_path(path, Utc::now());
    tokio::fs::rename(path, &backup).await?;
    diagnostics::global().increment_file_rotations();
    tracing::debug!(
        "Rotated log file {} to {}",
        path.display(),
        backup.display()
    );
    Ok(())
}

/// 生成备份文件路径：`<base>.<yyyymmdd-hhnnsszzz>[_<n>]<ext>`。
///
/// 同一毫秒内的重复轮转通过递增后缀找到空闲名字。
pub(crate) fn next_backup_path(path: &Path, timestamp: DateTime<Utc>) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pulse");
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();
    let stamp = timestamp.format("%Y%m%d-%H%M%S%3f");

    let mut candidate = path.with_file_name(format!("{}.{}{}", stem, stamp, extension));
    let mut counter = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{}.{}_{}{}", stem, stamp, counter, extension));
        counter += 1;
    }
    candidate
}

/// 改名失败时写入新文件的警告行。
fn move_warning_line(old_path: &Path, error: &std::io::Error) -> String {
    format!(
        "[{}] [WARN] [Thread:{}] Could not move previous log file {} to this location: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        current_thread_id(),
        old_path.display(),
        error
    )
}

/// 缺省目标路径：当前可执行文件名加 `.log` 后缀。
fn default_log_path() -> PathBuf {
    let stem = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_os_string()))
        .and_then(|s| s.into_string().ok())
        .unwrap_or_else(|| "pulse".to_string());
    PathBuf::from(format!("{}.log", stem))
}
