//! 启动监督模块
//!
//! 此模块包含 worker 的通道接线、每模块一线程的 step 循环，
//! 以及带就绪握手与整体回滚的启动监督器。

// 子模块声明
mod channels;
mod supervisor;
mod worker;

// 重新导出公共接口
pub use supervisor::DEFAULT_LAUNCH_TIMEOUT;
pub(crate) use channels::{WorkerChannels, WorkerLink};
pub(crate) use supervisor::spawn_workers;
pub(crate) use worker::Worker;
