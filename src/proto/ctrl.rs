//! 控制面消息
//!
//! 管理器（协调器）与 worker 之间通过控制通道交换的信号。

use crate::module::ModuleId;

/// 屏障中止原因，广播给所有等待中的 worker。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// 某个对端 worker 失败；携带失败模块名。
    PeerFailed { module: String },
    /// 外部取消。
    Cancelled,
}

/// 管理器 → worker。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtrlMsg {
    /// 广播步预算；worker 由此独立数到 T。
    Start { steps: u64 },
    /// 全员确认步 k 后放行；worker 收到后才能开始 k+1。
    Proceed { step: u64 },
    /// 中止运行；worker 在下一个检查点退出。
    Abort { reason: AbortReason },
}

/// worker → 管理器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMsg {
    /// 就绪握手：worker 已打开控制端点。
    Ready { module: ModuleId },
    /// worker 已完成步 k 的全部发送与接收。
    Ack { module: ModuleId, step: u64 },
    /// worker 已数到步预算并退出。
    Done { module: ModuleId },
    /// 模块实现在步 k 失败。
    Failed {
        module: ModuleId,
        step: u64,
        message: String,
    },
}
