//! 磁盘仿真描述
//!
//! graph_run 等二进制消费的 JSON 描述：模块声明 + 连接声明 +
//! 默认步数。纯数据；实例化逻辑在 demo/二进制侧。

use crate::route::ConnectionDecl;
use serde::{Deserialize, Serialize};

/// 一次运行的完整描述。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub steps: Option<u64>,
    pub modules: Vec<ModuleDecl>,
    #[serde(default)]
    pub connections: Vec<ConnectionDecl>,
}

/// 演示模块类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// 无输入源：输出由步号决定。
    Counter,
    /// 输入按增益转发到输出。
    Relay,
    /// 只消费输入。
    Sink,
    /// 在指定步返回失败（用于演练失败路径）。
    FailAfter,
}

/// 一个模块的声明。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    pub kind: ModuleKind,
    #[serde(default)]
    pub inputs: usize,
    #[serde(default)]
    pub outputs: usize,
    /// GPU 编号；缺省不绑定设备。
    #[serde(default)]
    pub device: Option<u32>,
    #[serde(default)]
    pub gain: Option<f64>,
    #[serde(default)]
    pub fail_at: Option<u64>,
    #[serde(default)]
    pub input_file: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub port_ctrl: Option<u16>,
    #[serde(default)]
    pub port_data: Option<u16>,
}

impl SimSpec {
    pub fn from_json(raw: &str) -> Result<SimSpec, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
