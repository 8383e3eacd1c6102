//! 核心类型与分发逻辑

pub mod dispatcher;
pub mod event;

pub use dispatcher::Dispatcher;
pub use event::{LogEntry, LogLevel};
