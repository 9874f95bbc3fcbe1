//! 模块句柄
//!
//! 管理器侧的 worker 代理：标识、设备、端点与生命周期状态。

use super::device::Device;
use super::id::ModuleId;
use crate::port::Endpoint;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// 句柄生命周期状态。
///
/// `Registered` 由 `add` 设置；`spawn` 依次经过 `Launching` 到 `Running`；
/// 结束于 `Completed` 或 `Failed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Registered,
    Launching,
    Running,
    Completed,
    Failed,
}

/// 一个 worker 的管理器侧句柄。
///
/// 状态槽在管理器、启动监督器与屏障协调器之间共享；
/// 端点与线程句柄在 `spawn` 成功后填入。
pub struct ModuleHandle {
    pub id: ModuleId,
    pub name: String,
    pub device: Device,
    pub endpoint: Option<Endpoint>,
    pub(crate) state: Arc<Mutex<ModuleState>>,
    pub(crate) join: Option<JoinHandle<()>>,
}

impl ModuleHandle {
    pub(crate) fn new(id: ModuleId, name: String, device: Device) -> ModuleHandle {
        ModuleHandle {
            id,
            name,
            device,
            endpoint: None,
            state: Arc::new(Mutex::new(ModuleState::Registered)),
            join: None,
        }
    }

    pub fn state(&self) -> ModuleState {
        *self.state.lock().expect("module state lock")
    }

    pub(crate) fn set_state(&self, next: ModuleState) {
        *self.state.lock().expect("module state lock") = next;
    }

    /// 共享状态槽，供协调器在运行中更新。
    pub(crate) fn state_slot(&self) -> Arc<Mutex<ModuleState>> {
        Arc::clone(&self.state)
    }
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("device", &self.device)
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
