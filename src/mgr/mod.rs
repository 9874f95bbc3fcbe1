//! 管理器模块
//!
//! 此模块包含顶层门面（add/connect/spawn/start/wait）、生命周期
//! 状态机、全局步计数器、屏障协调器与磁盘仿真描述。

// 子模块声明
mod coordinator;
mod manager;
mod simspec;
mod step_counter;

// 重新导出公共接口
pub use manager::{Manager, ManagerOpts};
pub use simspec::{ModuleDecl, ModuleKind, SimSpec};
pub use step_counter::StepCounter;
