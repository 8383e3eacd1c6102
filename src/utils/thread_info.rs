//! 线程信息获取模块
//!
//! 提供获取操作系统线程 ID 的函数。日志条目在调用方线程上构造，
//! 线程 ID 必须反映生产者线程而不是后台工作线程，因此这里取的是
//! 操作系统级的线程 ID 而不是 Rust 内部的 `ThreadId`。

/// 获取当前操作系统线程 ID。
///
/// 每个线程首次调用时执行一次系统调用，之后使用线程本地缓存。
///
/// # Examples
///
/// ```
/// use pulse_log::utils::current_thread_id;
///
/// let tid = current_thread_id();
/// assert!(tid > 0);
/// ```
pub fn current_thread_id() -> u64 {
    thread_local! {
        static CACHED_TID: u64 = os_thread_id();
    }
    CACHED_TID.with(|tid| *tid)
}

/// 通过平台系统调用获取线程 ID。
fn os_thread_id() -> u64 {
    // 在 Unix 系统上使用 gettid 系统调用
    #[cfg(unix)]
    {
        unsafe { libc::syscall(libc::SYS_gettid) as u64 }
    }

    // 在 Windows 上获取线程 ID
    #[cfg(windows)]
    {
        unsafe { winapi::um::processthreadsapi::GetCurrentThreadId() as u64 }
    }
}
