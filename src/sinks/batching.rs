//! 批处理引擎
//!
//! 可复用的异步批处理核心：有界队列 + 单个工作任务 + 双触发
//! 批量刷新 + 优雅停机排空。所有不能阻塞调用方的 sink（文件、
//! 网络）都构建在这个引擎之上。
//!
//! 生产者延迟与 sink I/O 延迟在这里解耦：调用方的 `log` 只是一次
//! 入队（队列满时产生背压），磁盘和网络的开销全部落在工作任务上。
//! 双触发在吞吐（按批发送）与新鲜度（有界滞后）之间取得平衡。

use crate::core::event::LogEntry;
use crate::diagnostics;
use crate::sinks::traits::SinkResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// 批处理参数
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// 有界队列容量；队列满时生产者阻塞（背压，而非丢弃）
    pub queue_capacity: usize,
    /// 批大小触发阈值
    pub batch_size: usize,
    /// 时间触发阈值：距上次刷新超过该时长且批非空时刷新
    pub flush_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            batch_size: 10,
            flush_interval: Duration::from_millis(100),
        }
    }
}

/// 批量写入器
///
/// 由具体 sink 实现的抽象写路径。`write_batch` 收到的切片有序且
/// 非空；返回的错误会被引擎捕获并吞掉，工作任务绝不因一次写入
/// 失败而终止。
#[async_trait]
pub trait BatchWriter: Send + Sync + 'static {
    /// 写入一个有序、非空的批次。
    async fn write_batch(&mut self, entries: &[LogEntry]) -> SinkResult<()>;

    /// 当前批处理参数。
    ///
    /// 返回 `Some` 的实现允许运行期调整批大小与刷新间隔：工作
    /// 任务在每个循环开始处重新读取，已提交的配置变更在下一个
    /// 周期生效。队列容量在构造时固定，这里返回的值被忽略。
    async fn batch_config(&self) -> Option<BatchConfig> {
        None
    }
}

/// 引擎内部消息
enum EngineMessage {
    /// 日志条目
    Entry(Box<LogEntry>),
    /// 排空信号，携带完成确认
    Drain(oneshot::Sender<()>),
}

/// 批处理引擎
///
/// 每个实例持有一个有界队列和一个长驻工作任务，状态沿
/// `Running -> Draining -> Stopped` 单向推进。停机开始后的
/// `log` 调用被静默丢弃（尽力而为的边界语义），不会在无人
/// 消费的队列上阻塞。
#[derive(Debug)]
pub struct BatchingEngine {
    sender: mpsc::Sender<EngineMessage>,
    shutting_down: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    name: &'static str,
}

impl BatchingEngine {
    /// 启动引擎：创建有界队列并派生工作任务。
    pub fn spawn<W: BatchWriter>(writer: W, config: BatchConfig, name: &'static str) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);

        let worker = EngineWorker {
            writer,
            receiver,
            batch_size: config.batch_size.max(1),
            flush_interval: config.flush_interval,
            batch: Vec::new(),
            last_flush: Instant::now(),
            name,
        };
        let handle = tokio::spawn(worker.run());

        Self {
            sender,
            shutting_down: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(Some(handle)),
            name,
        }
    }

    /// 入队一条日志条目。
    ///
    /// 队列满时挂起直到有空位（背压）。停机开始后条目被丢弃，
    /// 计入诊断，不会阻塞也不会报错。
    pub async fn log(&self, entry: LogEntry) {
        if self.shutting_down.load(Ordering::Acquire) {
            diagnostics::global().increment_entries_dropped_shutdown();
            return;
        }

        diagnostics::global().increment_entries_submitted();
        if self
            .sender
            .send(EngineMessage::Entry(Box::new(entry)))
            .await
            .is_err()
        {
            // 工作任务已退出，入队与停机在边界上竞争
            diagnostics::global().increment_entries_dropped_shutdown();
        }
    }

    /// 优雅停机：发出排空信号，等待最后一次刷新完成并回收工作任务。
    ///
    /// 幂等；与并发的 `log` 调用安全共存（边界上的条目尽力而为）。
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .sender
            .send(EngineMessage::Drain(ack_tx))
            .await
            .is_ok()
        {
            let _ = ack_rx.await;
        }

        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::error!("Error joining {} batch worker: {}", self.name, e);
            }
        }
    }

    /// 停机是否已开始。
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }
}

/// 引擎工作任务
struct EngineWorker<W: BatchWriter> {
    writer: W,
    receiver: mpsc::Receiver<EngineMessage>,
    batch_size: usize,
    flush_interval: Duration,
    batch: Vec<LogEntry>,
    last_flush: Instant,
    name: &'static str,
}

impl<W: BatchWriter> EngineWorker<W> {
    async fn run(mut self) {
        let mut ticker = interval_at(
            Instant::now() + self.flush_interval,
            self.flush_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = self.receiver.recv() => match message {
                    Some(EngineMessage::Entry(entry)) => {
                        self.refresh_batch_config(&mut ticker).await;
                        self.batch.push(*entry);
                        if self.batch.len() >= self.batch_size {
                            self.flush().await;
                        }
                    }
                    Some(EngineMessage::Drain(ack)) => {
                        self.drain_remaining();
                        self.flush().await;
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        // 所有发送端已释放，按排空处理
                        self.flush().await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.refresh_batch_config(&mut ticker).await;
                    if !self.batch.is_empty()
                        && self.last_flush.elapsed() >= self.flush_interval
                    {
                        self.flush().await;
                    }
                }
            }
        }

        tracing::debug!("{} batch worker stopped", self.name);
    }

    /// 循环开始处重读写入器的批处理参数，使运行期的配置变更在
    /// 下一个周期生效。间隔变化时重建定时器。
    async fn refresh_batch_config(&mut self, ticker: &mut Interval) {
        let Some(config) = self.writer.batch_config().await else {
            return;
        };

        self.batch_size = config.batch_size.max(1);
        if config.flush_interval != self.flush_interval {
            self.flush_interval = config.flush_interval;
            *ticker = interval_at(
                Instant::now() + config.flush_interval,
                config.flush_interval,
            );
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }
    }

    /// 停机信号之后仍滞留在队列里的条目一并并入最后一个批次。
    fn drain_remaining(&mut self) {
        while let Ok(message) = self.receiver.try_recv() {
            if let EngineMessage::Entry(entry) = message {
                self.batch.push(*entry);
            }
        }
    }

    /// 刷新当前批次。无论写入成败，批次都被清空（至多一次投递）。
    async fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        match self.writer.write_batch(&self.batch).await {
            Ok(()) => diagnostics::global().increment_batches_flushed(),
            Err(e) => {
                diagnostics::global().increment_flush_errors();
                tracing::warn!("{} sink failed to write batch of {}: {}", self.name, self.batch.len(), e);
            }
        }

        self.batch.clear();
        self.last_flush = Instant::now();
    }
}
