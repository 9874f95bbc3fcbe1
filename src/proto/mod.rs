//! 步协议消息
//!
//! 此模块包含屏障步协议的控制面与数据面消息类型。

// 子模块声明
mod ctrl;
mod data;

// 重新导出公共接口
pub use ctrl::{AbortReason, CtrlMsg, StatusMsg};
pub use data::DataMsg;
