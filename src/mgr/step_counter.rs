//! 全局步计数器
//!
//! 「当前第 N 步 / 共 T 步」的唯一权威。只有屏障协调器在全员确认
//! 后推进；worker 维护本地镜像，绝不领先于协调器已放行的步号。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 管理器持有的步计数器；读侧通过原子镜像共享。
#[derive(Debug, Default, Clone)]
pub struct StepCounter {
    total: u64,
    current: Arc<AtomicU64>,
}

impl StepCounter {
    pub(crate) fn start(total: u64) -> StepCounter {
        StepCounter {
            total,
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 已完成（全员确认）的步数。
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// 本次运行的步预算 T。
    pub fn total(&self) -> u64 {
        self.total
    }

    /// 协调器侧的写入口：单调推进到 `completed`。
    pub(crate) fn advance_to(&self, completed: u64) {
        debug_assert!(completed <= self.total);
        self.current.fetch_max(completed, Ordering::SeqCst);
    }

    pub(crate) fn mirror(&self) -> StepCounter {
        StepCounter {
            total: self.total,
            current: Arc::clone(&self.current),
        }
    }
}
