//! 端点模块
//!
//! 此模块包含模块实例的通信端点（控制通道 + 数据通道的标识对）
//! 与管理器生命周期内不冲突的端口分配器。

// 子模块声明
mod allocator;
mod endpoint;

// 重新导出公共接口
pub use allocator::{DEFAULT_PORT_BASE, PortAllocator};
pub use endpoint::Endpoint;
