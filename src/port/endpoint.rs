//! 端点
//!
//! 一个模块实例在一次运行内独占的 (控制, 数据) 通道标识对。
//! 标识是进程内通道编号，不是 OS 套接字端口。

use serde::{Deserialize, Serialize};

/// (控制, 数据) 端口对；由分配器在 `spawn` 时分配，teardown 时释放。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub ctrl: u16,
    pub data: u16,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctrl:{}/data:{}", self.ctrl, self.data)
    }
}
