//! 计算设备绑定
//!
//! 对编排器而言设备只是一个不透明选择子，原样转交给模块实现。

use serde::{Deserialize, Serialize};

/// 计算设备选择子。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// 不绑定设备。
    #[default]
    None,
    /// 绑定到指定 GPU 编号。
    Gpu(u32),
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::None => write!(f, "none"),
            Device::Gpu(idx) => write!(f, "gpu{idx}"),
        }
    }
}
