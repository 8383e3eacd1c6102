//! 网络 Sink
//!
//! 构建在批处理引擎之上的 HTTP 输出：条目被序列化为 CLEF
//! （Compact Log Event Format）——每行一个 JSON 对象，换行分隔，
//! 不带外层数组——然后整批 POST 到日志服务器的原始事件端点。
//!
//! 传输失败被捕获并丢弃：此 sink 按设计是尽力而为的，不提供
//! 至少一次投递。唯一向外暴露的诊断路径是同步的连接校验探针，
//! 它把按状态码分类的结果通过分发器本身回报出来。

use crate::config::NetworkSinkConfig;
use crate::core::dispatcher::Dispatcher;
use crate::core::event::{LogEntry, LogLevel};
use crate::error::{PulseLogError, Result};
use crate::sinks::batching::{BatchConfig, BatchWriter, BatchingEngine};
use crate::sinks::traits::{Sink, SinkError, SinkResult};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// 批次提交端点
const EVENTS_ENDPOINT: &str = "/api/events/raw";
/// 连接校验端点
const VALIDATION_ENDPOINT: &str = "/api";
/// 行分隔 JSON 的媒体类型
const CLEF_CONTENT_TYPE: &str = "application/vnd.serilog.clef";
/// API key 请求头
const API_KEY_HEADER: &str = "X-Seq-ApiKey";
/// 批次提交的总超时
const SHIP_TIMEOUT: Duration = Duration::from_secs(30);
/// 校验探针的连接超时
const VALIDATE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// 校验探针的响应超时
const VALIDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// 网络 Sink
#[derive(Debug)]
pub struct NetworkSink {
    engine: BatchingEngine,
    config: Arc<RwLock<NetworkSinkConfig>>,
    client: reqwest::Client,
}

impl NetworkSink {
    /// 创建网络 sink 并启动其批处理工作任务。
    ///
    /// 未配置 URL 时 sink 处于禁用状态：批次写入是空操作。
    pub fn new(config: NetworkSinkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SHIP_TIMEOUT)
            .build()
            .map_err(|e| PulseLogError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        let batch = config.batch();
        let shared = Arc::new(RwLock::new(config));
        let writer = NetworkBatchWriter {
            config: shared.clone(),
            client: client.clone(),
        };
        let engine = BatchingEngine::spawn(writer, batch, "network");

        Ok(Self {
            engine,
            config: shared,
            client,
        })
    }

    /// 替换配置快照（copy-on-write），工作任务在下一个周期读取。
    ///
    /// URL、API key、标签以及批大小和刷新间隔都在下一次使用时
    /// 生效；队列容量在构造时固定。
    pub async fn update_config(&self, config: NetworkSinkConfig) {
        *self.config.write().await = config;
    }

    /// 当前配置的快照。
    pub async fn config(&self) -> NetworkSinkConfig {
        self.config.read().await.clone()
    }

    /// 同步连接校验探针。
    ///
    /// 对服务器状态端点发起一次轻量 GET，并将结果分类为可行动的
    /// 诊断消息，通过 `dispatcher` 以 Info（成功）或 Error（失败）
    /// 级别回报。返回探测是否成功；本方法永不上抛错误。
    pub async fn validate_connection(&self, dispatcher: &Dispatcher) -> bool {
        let snapshot = self.config.read().await.clone();

        let Some(base_url) = snapshot.url else {
            dispatcher
                .log(
                    LogLevel::Error,
                    "Log server is not configured: set a server URL before validating the connection",
                )
                .await;
            return false;
        };

        let client = match reqwest::Client::builder()
            .connect_timeout(VALIDATE_CONNECT_TIMEOUT)
            .timeout(VALIDATE_TIMEOUT)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                dispatcher
                    .log(
                        LogLevel::Error,
                        format!("Log server connection check could not start: {}", e),
                    )
                    .await;
                return false;
            }
        };

        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), VALIDATION_ENDPOINT);
        let mut request = client.get(&endpoint);
        if let Some(ref api_key) = snapshot.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        match request.send().await {
            Ok(response) => match response.status().as_u16() {
                200 => {
                    dispatcher
                        .log(
                            LogLevel::Info,
                            format!("Log server connection validated: {}", endpoint),
                        )
                        .await;
                    true
                }
                status @ (401 | 403) => {
                    dispatcher
                        .log(
                            LogLevel::Error,
                            format!(
                                "Log server authentication failed (status {}): check the configured API key",
                                status
                            ),
                        )
                        .await;
                    false
                }
                404 => {
                    dispatcher
                        .log(
                            LogLevel::Error,
                            format!(
                                "Log server endpoint not found at {}: check the server URL",
                                endpoint
                            ),
                        )
                        .await;
                    false
                }
                status => {
                    dispatcher
                        .log(
                            LogLevel::Error,
                            format!("Log server returned unexpected status {}", status),
                        )
                        .await;
                    false
                }
            },
            Err(e) => {
                dispatcher
                    .log(
                        LogLevel::Error,
                        format!("Network error while contacting {}: {}", endpoint, e),
                    )
                    .await;
                false
            }
        }
    }
}

#[async_trait]
impl Sink for NetworkSink {
    async fn log(&self, entry: LogEntry) {
        self.engine.log(entry).await;
    }

    async fn shutdown(&self) {
        self.engine.shutdown().await;
    }

    fn name(&self) -> &'static str {
        "network"
    }
}

/// 网络批量写入器，由引擎工作任务驱动。
#[derive(Debug)]
struct NetworkBatchWriter {
    config: Arc<RwLock<NetworkSinkConfig>>,
    client: reqwest::Client,
}

#[async_trait]
impl BatchWriter for NetworkBatchWriter {
    async fn batch_config(&self) -> Option<BatchConfig> {
        Some(self.config.read().await.batch())
    }

    async fn write_batch(&mut self, entries: &[LogEntry]) -> SinkResult<()> {
        // 每次刷新开始时读取一次配置快照，不会看到撕裂的值
        let snapshot = self.config.read().await.clone();
        let Some(ref base_url) = snapshot.url else {
            // 未配置即禁用，批次静默丢弃
            return Ok(());
        };

        let payload = entries
            .iter()
            .map(|entry| to_clef_line(entry, &snapshot))
            .collect::<Vec<_>>()
            .join("\n");

        let url = format!("{}{}", base_url.trim_end_matches('/'), EVENTS_ENDPOINT);
        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", CLEF_CONTENT_TYPE)
            .body(payload);
        if let Some(ref api_key) = snapshot.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Network(format!("Failed to ship log batch: {}", e)))?;

        if !response.status().is_success() {
            return Err(SinkError::Network(format!(
                "Log server rejected batch with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// 把一条日志条目序列化为一行 CLEF JSON。
pub(crate) fn to_clef_line(entry: &LogEntry, config: &NetworkSinkConfig) -> String {
    let mut event = serde_json::Map::new();
    event.insert(
        "@t".to_string(),
        json!(entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    event.insert("@l".to_string(), json!(entry.level.clef_name()));
    event.insert("@m".to_string(), json!(entry.message));
    event.insert("ThreadId".to_string(), json!(entry.thread_id));
    if let Some(ref source) = config.source {
        event.insert("Source".to_string(), json!(source));
    }
    if let Some(ref instance) = config.instance {
        event.insert("Instance".to_string(), json!(instance));
    }
    if let Some(ref details) = entry.details {
        event.insert("Details".to_string(), json!(details));
    }

    serde_json::Value::Object(event).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::LogLevel;
    use std::sync::Mutex as StdMutex;

    /// 收集所有收到条目的测试 sink
    #[derive(Debug, Default)]
    struct CollectingSink {
        entries: Arc<StdMutex<Vec<LogEntry>>>,
    }

    #[async_trait]
    impl Sink for CollectingSink {
        async fn log(&self, entry: LogEntry) {
            self.entries.lock().unwrap().push(entry);
        }

        async fn shutdown(&self) {}

        fn name(&self) -> &'static str {
            "collecting"
        }
    }

    #[test]
    fn test_clef_round_trip() {
        let config = NetworkSinkConfig {
            source: Some("api-server".to_string()),
            instance: Some("node-1".to_string()),
            ..Default::default()
        };
        let entry = LogEntry::new(
            LogLevel::Warn,
            "queue depth high",
            Some("depth=900".to_string()),
        );

        let line = to_clef_line(&entry, &config);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["@l"], "Warning");
        assert_eq!(parsed["@m"], "queue depth high");
        assert_eq!(parsed["ThreadId"], entry.thread_id);
        assert_eq!(parsed["Source"], "api-server");
        assert_eq!(parsed["Instance"], "node-1");
        assert_eq!(parsed["Details"], "depth=900");

        // 时间戳为毫秒精度的 UTC ISO-8601
        let stamp = parsed["@t"].as_str().unwrap();
        assert!(stamp.ends_with('Z'));
        let parsed_time = chrono::DateTime::parse_from_rfc3339(stamp).unwrap();
        assert_eq!(
            parsed_time.timestamp_millis(),
            entry.timestamp.timestamp_millis()
        );
    }

    #[test]
    fn test_clef_omits_unconfigured_fields() {
        let entry = LogEntry::new(LogLevel::Trace, "noise", None);
        let line = to_clef_line(&entry, &NetworkSinkConfig::default());
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["@l"], "Verbose");
        assert!(parsed.get("Source").is_none());
        assert!(parsed.get("Instance").is_none());
        assert!(parsed.get("Details").is_none());
    }

    #[tokio::test]
    async fn test_write_batch_without_url_is_noop() {
        let mut writer = NetworkBatchWriter {
            config: Arc::new(RwLock::new(NetworkSinkConfig::default())),
            client: reqwest::Client::new(),
        };
        let entries = vec![LogEntry::new(LogLevel::Info, "dropped silently", None)];
        assert!(writer.write_batch(&entries).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_without_url_reports_not_configured() {
        let dispatcher = Dispatcher::new();
        let collecting = Arc::new(CollectingSink::default());
        let entries = collecting.entries.clone();
        dispatcher.register_sink(collecting).await;

        let sink = NetworkSink::new(NetworkSinkConfig::default()).unwrap();
        let ok = sink.validate_connection(&dispatcher).await;
        assert!(!ok);

        let recorded = entries.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].level, LogLevel::Error);
        assert!(recorded[0].message.contains("not configured"));

        sink.shutdown().await;
    }

    #[tokio::test]
    async fn test_validate_unreachable_url_reports_network_error() {
        let dispatcher = Dispatcher::new();
        let collecting = Arc::new(CollectingSink::default());
        let entries = collecting.entries.clone();
        dispatcher.register_sink(collecting).await;

        // 127.0.0.1:9 (discard) 上没有监听者
        let sink = NetworkSink::new(NetworkSinkConfig {
            url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        })
        .unwrap();
        let ok = sink.validate_connection(&dispatcher).await;
        assert!(!ok);

        let recorded = entries.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].level, LogLevel::Error);
        assert!(recorded[0].message.contains("Network error"));

        sink.shutdown().await;
    }

    #[tokio::test]
    async fn test_update_config_swaps_snapshot() {
        let sink = NetworkSink::new(NetworkSinkConfig::default()).unwrap();
        assert!(sink.config().await.url.is_none());

        sink.update_config(NetworkSinkConfig {
            url: Some("http://localhost:5341".to_string()),
            source: Some("worker".to_string()),
            ..Default::default()
        })
        .await;

        let snapshot = sink.config().await;
        assert_eq!(snapshot.url.as_deref(), Some("http://localhost:5341"));
        assert_eq!(snapshot.source.as_deref(), Some("worker"));

        sink.shutdown().await;
    }
}
