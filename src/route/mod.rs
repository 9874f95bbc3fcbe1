//! 路由模块
//!
//! 此模块包含跨模块数据交换的静态路由：连接声明、路由条目
//! 与一次构建、运行期只读的路由表。

// 子模块声明
mod entry;
mod table;

// 重新导出公共接口
pub use entry::{ConnectionDecl, RoutingEntry};
pub use table::RoutingTable;
