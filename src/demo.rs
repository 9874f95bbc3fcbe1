//! 演示和示例代码
//!
//! 包含演示用的模块实现与图构建函数，供二进制与测试共享。

use crate::error::Error;
use crate::mgr::{Manager, ModuleKind, SimSpec};
use crate::module::{Device, LaunchInfo, ModuleError, ModuleId, ModuleSpec, StepModule};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 计数源：无输入，`outputs[i] = step * scale + i`。
#[derive(Debug, Clone)]
pub struct CounterModule {
    pub scale: f64,
}

impl Default for CounterModule {
    fn default() -> Self {
        CounterModule { scale: 1.0 }
    }
}

impl StepModule for CounterModule {
    fn step(&mut self, step: u64, _inputs: &[f64], outputs: &mut [f64]) -> Result<(), ModuleError> {
        for (i, out) in outputs.iter_mut().enumerate() {
            *out = step as f64 * self.scale + i as f64;
        }
        Ok(())
    }
}

/// 转发模块：`outputs[i] = gain * inputs[i]`（多余的输出位补零）。
#[derive(Debug, Clone)]
pub struct RelayModule {
    pub gain: f64,
}

impl Default for RelayModule {
    fn default() -> Self {
        RelayModule { gain: 1.0 }
    }
}

impl StepModule for RelayModule {
    fn step(&mut self, _step: u64, inputs: &[f64], outputs: &mut [f64]) -> Result<(), ModuleError> {
        for (i, out) in outputs.iter_mut().enumerate() {
            *out = self.gain * inputs.get(i).copied().unwrap_or(0.0);
        }
        Ok(())
    }
}

/// 汇模块：把每步看到的输入缓冲记录到共享日志。
///
/// 注意第 k 步记录的是上一步屏障交换后的输入（第 0 步为全零）。
pub struct SinkModule {
    pub log: Arc<Mutex<Vec<Vec<f64>>>>,
}

impl SinkModule {
    pub fn new() -> (SinkModule, Arc<Mutex<Vec<Vec<f64>>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            SinkModule {
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl StepModule for SinkModule {
    fn step(&mut self, _step: u64, inputs: &[f64], _outputs: &mut [f64]) -> Result<(), ModuleError> {
        self.log.lock().expect("sink log lock").push(inputs.to_vec());
        Ok(())
    }
}

/// 在指定步返回失败的模块，用于演练屏障的失败路径。
#[derive(Debug, Clone)]
pub struct FailAfterModule {
    pub fail_at: u64,
}

impl StepModule for FailAfterModule {
    fn step(&mut self, step: u64, _inputs: &[f64], outputs: &mut [f64]) -> Result<(), ModuleError> {
        if step >= self.fail_at {
            return Err(ModuleError::new(format!("forced failure at step {step}")));
        }
        outputs.fill(step as f64);
        Ok(())
    }
}

/// 启动阶段阻塞指定时长的模块，用于演练启动超时与整体回滚。
#[derive(Debug, Clone)]
pub struct SlowLaunchModule {
    pub delay: Duration,
}

impl StepModule for SlowLaunchModule {
    fn on_launch(&mut self, _info: &LaunchInfo) -> Result<(), ModuleError> {
        std::thread::sleep(self.delay);
        Ok(())
    }

    fn step(&mut self, step: u64, _inputs: &[f64], outputs: &mut [f64]) -> Result<(), ModuleError> {
        outputs.fill(step as f64);
        Ok(())
    }
}

/// 构建一条 `stages` 级、宽度 `width` 的链：
/// counter -> relay -> ... -> relay，相邻级按恒等索引连接。
pub fn build_chain(
    man: &mut Manager,
    stages: usize,
    width: usize,
) -> Result<Vec<ModuleId>, Error> {
    let identity: Vec<(usize, usize)> = (0..width).map(|i| (i, i)).collect();
    let mut ids = Vec::with_capacity(stages);
    for s in 0..stages {
        let id = if s == 0 {
            man.add(ModuleSpec::new(
                format!("stage{s}"),
                CounterModule::default(),
                0,
                width,
            ))?
        } else {
            man.add(ModuleSpec::new(
                format!("stage{s}"),
                RelayModule::default(),
                width,
                width,
            ))?
        };
        ids.push(id);
    }
    for w in ids.windows(2) {
        man.connect(w[0], w[1], identity.clone())?;
    }
    Ok(ids)
}

/// 按 SimSpec 实例化演示模块并接好连接。
pub fn build_from_spec(man: &mut Manager, spec: &SimSpec) -> Result<Vec<ModuleId>, Error> {
    let mut by_name: HashMap<&str, ModuleId> = HashMap::new();
    for decl in &spec.modules {
        let runner: Box<dyn StepModule> = match decl.kind {
            ModuleKind::Counter => Box::new(CounterModule {
                scale: decl.gain.unwrap_or(1.0),
            }),
            ModuleKind::Relay => Box::new(RelayModule {
                gain: decl.gain.unwrap_or(1.0),
            }),
            ModuleKind::Sink => Box::new(SinkModule::new().0),
            ModuleKind::FailAfter => Box::new(FailAfterModule {
                fail_at: decl.fail_at.unwrap_or(0),
            }),
        };
        let device = decl.device.map(Device::Gpu).unwrap_or(Device::None);
        let mspec = ModuleSpec::new_boxed(&decl.name, runner, decl.inputs, decl.outputs)
            .with_device(device)
            .with_io_files(decl.input_file.clone(), decl.output_file.clone())
            .with_ports(decl.port_ctrl, decl.port_data);
        let id = man.add(mspec)?;
        by_name.insert(decl.name.as_str(), id);
    }
    for conn in &spec.connections {
        let src = *by_name
            .get(conn.src.as_str())
            .ok_or_else(|| Error::config(format!("connection references unknown module {:?}", conn.src)))?;
        let dst = *by_name
            .get(conn.dst.as_str())
            .ok_or_else(|| Error::config(format!("connection references unknown module {:?}", conn.dst)))?;
        man.connect(src, dst, conn.links.clone())?;
    }
    Ok(spec
        .modules
        .iter()
        .map(|d| by_name[d.name.as_str()])
        .collect())
}
