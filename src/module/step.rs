//! 步进能力 trait
//!
//! 编排器对模块内部一无所知，只通过「给定当前输入算一步、
//! 产出输出」与就绪/失败信号和模块实现交互。

use super::device::Device;
use thiserror::Error;

/// 模块实现内部的失败；worker 将其转换为对管理器的 Failed 信号。
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ModuleError(pub String);

impl ModuleError {
    pub fn new(msg: impl Into<String>) -> ModuleError {
        ModuleError(msg.into())
    }
}

/// 启动时转交给模块实现的上下文：设备绑定与不透明的 I/O 文件路径。
#[derive(Debug, Clone)]
pub struct LaunchInfo {
    pub module: String,
    pub device: Device,
    pub input_file: Option<String>,
    pub output_file: Option<String>,
}

/// 可被编排器驱动的仿真模块。
///
/// `step` 在每个全局步调用一次：`inputs` 是上一步屏障交换后的输入缓冲
/// （第 0 步为全零），实现将本步输出写入 `outputs`。返回 `Err` 表示模块
/// 失败，整个运行将经由屏障的失败路径中止。
pub trait StepModule: Send + 'static {
    /// worker 就绪握手前调用一次；返回 `Err` 视为启动失败并触发整体回滚。
    fn on_launch(&mut self, info: &LaunchInfo) -> Result<(), ModuleError> {
        let _ = info;
        Ok(())
    }

    /// 计算一个本地步。
    fn step(&mut self, step: u64, inputs: &[f64], outputs: &mut [f64]) -> Result<(), ModuleError>;
}
