//! 路由条目
//!
//! 描述一对模块之间的定向连接：源模块的哪些输出元素
//! 写入目标模块的哪些输入元素。

use crate::module::ModuleId;
use serde::{Deserialize, Serialize};

/// 一条 (源, 目标) 连接及其 (源索引, 目标索引) 对序列。
///
/// 传输寻址在 `spawn` 时固定；运行期没有任何动态寻址或重排。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingEntry {
    pub src: ModuleId,
    pub dst: ModuleId,
    pub pairs: Vec<(usize, usize)>,
}

/// 按名字声明的连接，来自 spec 文件等外部连通性来源；
/// 管理器在 `spawn` 时解析为 `RoutingEntry`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDecl {
    pub src: String,
    pub dst: String,
    pub links: Vec<(usize, usize)>,
}
