//! 数据面消息
//!
//! 每步沿出边路由条目投递的边界数据。编排器不解释其科学含义，
//! 只按条目中固定的 (源索引, 目标索引) 对寻址。

use crate::module::ModuleId;

/// 一条按路由条目聚集的步数据。
///
/// `values[i]` 对应条目 `pairs[i]`：发送端按源索引聚集，
/// 接收端按目标索引散布。
#[derive(Debug, Clone)]
pub struct DataMsg {
    pub src: ModuleId,
    pub step: u64,
    pub values: Vec<f64>,
}
