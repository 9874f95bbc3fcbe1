//! 模块标识
//!
//! 定义模块的稳定编号（按 `add` 顺序分配）。

use serde::{Deserialize, Serialize};

/// 模块编号；由管理器按注册顺序分配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m{}", self.0)
    }
}
