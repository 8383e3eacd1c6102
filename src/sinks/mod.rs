//! Sink 实现模块
//!
//! 包含所有内建日志输出目标，以及它们共享的批处理引擎。

pub mod batching;
pub mod console;
pub mod file;
pub mod network;
pub mod traits;

pub use batching::{BatchConfig, BatchWriter, BatchingEngine};
pub use console::ConsoleSink;
pub use file::FileSink;
pub use network::NetworkSink;
pub use traits::{Sink, SinkError, SinkResult};
