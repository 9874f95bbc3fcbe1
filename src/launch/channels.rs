//! worker 通道接线
//!
//! 每个 worker 独占一条控制下行通道、一条状态上行通道和
//! 一个数据接收端；数据发送端按出边路由条目指向各目标模块。

use crate::module::{ModuleId, ModuleState};
use crate::proto::{CtrlMsg, DataMsg, StatusMsg};
use crossbeam_channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// worker 侧的通道束，随 worker 线程移动。
pub(crate) struct WorkerChannels {
    pub ctrl_rx: Receiver<CtrlMsg>,
    pub status_tx: Sender<StatusMsg>,
    pub data_rx: Receiver<DataMsg>,
    /// 出边目标模块 -> 其数据发送端。
    pub data_txs: HashMap<ModuleId, Sender<DataMsg>>,
}

/// 管理器/协调器侧对一个 worker 的链接。
pub(crate) struct WorkerLink {
    pub id: ModuleId,
    pub name: String,
    pub ctrl_tx: Sender<CtrlMsg>,
    pub status_rx: Receiver<StatusMsg>,
    /// 与句柄共享的状态槽。
    pub state: Arc<Mutex<ModuleState>>,
}

impl WorkerLink {
    pub(crate) fn set_state(&self, next: ModuleState) {
        *self.state.lock().expect("module state lock") = next;
    }
}
