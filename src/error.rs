//! 错误类型
//!
//! 定义编排器的错误分类：配置错误、端口占用、启动超时、
//! 生命周期违规、对端失败聚合与取消。

use thiserror::Error;

/// 管理器生命周期状态（用于 Lifecycle 错误报告与状态查询）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Empty,
    Configured,
    Spawned,
    Started,
    Finished,
}

/// 编排器错误。
///
/// `spawn` 阶段的错误在内部先回滚已启动的 worker，再以单个错误返回；
/// 运行阶段的错误通过 `wait()` 返回，绝不静默吞掉。
#[derive(Debug, Error)]
pub enum Error {
    /// 路由/模块描述非法（重复写入、越界索引、重名模块等）。
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 显式请求的端口已被占用。
    #[error("port {port} already in use")]
    PortInUse { port: u16 },

    /// worker 未在启动超时内完成就绪握手。
    #[error("module {module} failed to report ready within launch timeout")]
    LaunchTimeout { module: String },

    /// 生命周期方法调用顺序非法；不改变任何状态。
    #[error("lifecycle error: {method}() not valid in state {state:?}")]
    Lifecycle {
        method: &'static str,
        state: ManagerState,
    },

    /// 一个或多个 worker 在运行中失败；`step` 为检测到失败时的全局步号。
    #[error("module(s) failed at step {step}: {}", failed.join(", "))]
    PeersFailed { failed: Vec<String>, step: u64 },

    /// 外部取消，在下一个步检查点生效。
    #[error("run cancelled at step {step}")]
    Cancelled { step: u64 },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Error {
        Error::Configuration(msg.into())
    }
}
