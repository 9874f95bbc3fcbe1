//! 模块描述
//!
//! 客户端在 `spawn` 前构造一次，此后不可变。

use super::device::Device;
use super::step::StepModule;

/// 一个待编排模块的完整描述：唯一名字、设备绑定、输入/输出元素数、
/// 可选的 I/O 文件绑定与显式端口请求，以及模块实现本体。
pub struct ModuleSpec {
    pub name: String,
    pub device: Device,
    pub n_inputs: usize,
    pub n_outputs: usize,
    /// 不透明传递给模块实现，编排器不读写。
    pub input_file: Option<String>,
    pub output_file: Option<String>,
    /// 显式端口请求；`None` 表示由分配器选取最小空闲端口。
    pub port_ctrl: Option<u16>,
    pub port_data: Option<u16>,
    pub(crate) runner: Box<dyn StepModule>,
}

impl ModuleSpec {
    pub fn new(
        name: impl Into<String>,
        runner: impl StepModule,
        n_inputs: usize,
        n_outputs: usize,
    ) -> ModuleSpec {
        ModuleSpec {
            name: name.into(),
            device: Device::None,
            n_inputs,
            n_outputs,
            input_file: None,
            output_file: None,
            port_ctrl: None,
            port_data: None,
            runner: Box::new(runner),
        }
    }

    /// 同 `new`，但接受已装箱的模块实现（spec 文件实例化路径）。
    pub fn new_boxed(
        name: impl Into<String>,
        runner: Box<dyn StepModule>,
        n_inputs: usize,
        n_outputs: usize,
    ) -> ModuleSpec {
        ModuleSpec {
            name: name.into(),
            device: Device::None,
            n_inputs,
            n_outputs,
            input_file: None,
            output_file: None,
            port_ctrl: None,
            port_data: None,
            runner,
        }
    }

    pub fn with_device(mut self, device: Device) -> ModuleSpec {
        self.device = device;
        self
    }

    pub fn with_io_files(
        mut self,
        input_file: Option<String>,
        output_file: Option<String>,
    ) -> ModuleSpec {
        self.input_file = input_file;
        self.output_file = output_file;
        self
    }

    pub fn with_ports(mut self, port_ctrl: Option<u16>, port_data: Option<u16>) -> ModuleSpec {
        self.port_ctrl = port_ctrl;
        self.port_data = port_data;
        self
    }
}

impl std::fmt::Debug for ModuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleSpec")
            .field("name", &self.name)
            .field("device", &self.device)
            .field("n_inputs", &self.n_inputs)
            .field("n_outputs", &self.n_outputs)
            .field("input_file", &self.input_file)
            .field("output_file", &self.output_file)
            .field("port_ctrl", &self.port_ctrl)
            .field("port_data", &self.port_data)
            .finish_non_exhaustive()
    }
}
