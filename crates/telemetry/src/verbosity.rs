//! 诊断详细级别
//!
//! 类似 klog 的 `-v`：数值越大输出越详细。级别由调用方注入，而不是全局状态，
//! 运行期可以随时调整。

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// 详细级别门控
///
/// 每次输出诊断日志前查询一次
pub trait VerbosityGate: Send + Sync {
    /// 给定级别的日志是否应该输出
    fn enabled(&self, level: u8) -> bool;
}

/// 可共享的运行期详细级别
///
/// 克隆后共享同一个级别，`set_level` 对所有持有者立即可见
#[derive(Debug, Clone, Default)]
pub struct Verbosity {
    level: Arc<AtomicU8>,
}

impl Verbosity {
    pub fn new(level: u8) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(level)),
        }
    }

    /// 当前级别
    pub fn level(&self) -> u8 {
        self.level.load(Ordering::Relaxed)
    }

    /// 调整级别
    pub fn set_level(&self, level: u8) {
        let previous = self.level.swap(level, Ordering::Relaxed);
        if previous != level {
            tracing::info!(previous, current = level, "Verbosity changed");
        }
    }
}

impl VerbosityGate for Verbosity {
    fn enabled(&self, level: u8) -> bool {
        self.level() >= level
    }
}

impl<F> VerbosityGate for F
where
    F: Fn(u8) -> bool + Send + Sync,
{
    fn enabled(&self, level: u8) -> bool {
        self(level)
    }
}
