//! 实用工具模块
//!
//! 提供各种辅助功能和工具函数

pub mod thread_info;

pub use thread_info::current_thread_id;
