//! 管理器门面
//!
//! 组合路由表、端口分配器、启动监督器与屏障协调器的顶层入口：
//! `add`/`connect` → `spawn` → `start(steps)` → `wait`。
//! 生命周期：EMPTY → CONFIGURED → SPAWNED → STARTED → FINISHED；
//! 乱序调用返回 Lifecycle 错误且不改变任何状态。

use crate::error::{Error, ManagerState};
use crate::launch::{
    DEFAULT_LAUNCH_TIMEOUT, Worker, WorkerChannels, WorkerLink, spawn_workers,
};
use crate::module::{LaunchInfo, ModuleHandle, ModuleId, ModuleSpec, ModuleState};
use crate::port::{DEFAULT_PORT_BASE, Endpoint, PortAllocator};
use crate::proto::{CtrlMsg, DataMsg, StatusMsg};
use crate::route::{RoutingEntry, RoutingTable};
use crossbeam_channel::{Sender, unbounded};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::coordinator::Coordinator;
use super::step_counter::StepCounter;

/// 管理器选项。
#[derive(Debug, Clone)]
pub struct ManagerOpts {
    pub launch_timeout: Duration,
    pub port_base: u16,
    /// 设置后在 `spawn` 时把构建好的路由表写入该目录（routing.json）。
    pub debug_dir: Option<PathBuf>,
}

impl Default for ManagerOpts {
    fn default() -> Self {
        ManagerOpts {
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
            port_base: DEFAULT_PORT_BASE,
            debug_dir: None,
        }
    }
}

/// 分布式模块编排器的顶层门面。
pub struct Manager {
    state: ManagerState,
    opts: ManagerOpts,
    /// 待启动的模块描述；`spawn` 时整体取出。
    specs: Vec<ModuleSpec>,
    handles: Vec<ModuleHandle>,
    connections: Vec<RoutingEntry>,
    allocator: PortAllocator,
    routing: Option<Arc<RoutingTable>>,
    /// `spawn` 与 `start` 之间暂存的 worker 链接。
    links: Option<Vec<WorkerLink>>,
    counter: StepCounter,
    cancel_tx: Option<Sender<()>>,
    coord: Option<JoinHandle<Result<(), Error>>>,
}

impl Default for Manager {
    fn default() -> Self {
        Manager::new()
    }
}

impl Manager {
    pub fn new() -> Manager {
        Manager::with_opts(ManagerOpts::default())
    }

    pub fn with_opts(opts: ManagerOpts) -> Manager {
        let allocator = PortAllocator::new(opts.port_base);
        Manager {
            state: ManagerState::Empty,
            opts,
            specs: Vec::new(),
            handles: Vec::new(),
            connections: Vec::new(),
            allocator,
            routing: None,
            links: None,
            counter: StepCounter::default(),
            cancel_tx: None,
            coord: None,
        }
    }

    /// 注册一个模块；仅在 EMPTY/CONFIGURED 状态合法。
    /// 名字必须全局唯一，重名返回配置错误且不改变状态。
    pub fn add(&mut self, spec: ModuleSpec) -> Result<ModuleId, Error> {
        match self.state {
            ManagerState::Empty | ManagerState::Configured => {}
            state => return Err(Error::Lifecycle { method: "add", state }),
        }
        if self.specs.iter().any(|s| s.name == spec.name) {
            return Err(Error::config(format!(
                "module name {:?} already registered",
                spec.name
            )));
        }
        let id = ModuleId(self.specs.len());
        debug!(%id, name = %spec.name, device = %spec.device, "注册模块");
        self.handles
            .push(ModuleHandle::new(id, spec.name.clone(), spec.device));
        self.specs.push(spec);
        self.state = ManagerState::Configured;
        Ok(id)
    }

    /// 声明一条定向连接：`src` 的输出元素按 `pairs` 写入 `dst` 的输入。
    /// 索引与唯一性校验在 `spawn` 构建路由表时统一执行。
    pub fn connect(
        &mut self,
        src: ModuleId,
        dst: ModuleId,
        pairs: Vec<(usize, usize)>,
    ) -> Result<(), Error> {
        if self.state != ManagerState::Configured {
            return Err(Error::Lifecycle {
                method: "connect",
                state: self.state,
            });
        }
        if src.0 >= self.specs.len() || dst.0 >= self.specs.len() {
            return Err(Error::config(format!(
                "connect({src}, {dst}): unknown module id"
            )));
        }
        self.connections.push(RoutingEntry { src, dst, pairs });
        Ok(())
    }

    /// 分配端点、构建路由切片并启动全部 worker（全有或全无）。
    ///
    /// 任何失败都先回滚已启动的部分再返回；失败后管理器进入 FINISHED，
    /// 不支持重新 spawn（失败 worker 的进程内状态不可恢复）。
    #[tracing::instrument(skip(self), fields(modules = self.specs.len()))]
    pub fn spawn(&mut self) -> Result<(), Error> {
        if self.state != ManagerState::Configured {
            return Err(Error::Lifecycle {
                method: "spawn",
                state: self.state,
            });
        }

        let output_len: Vec<usize> = self.specs.iter().map(|s| s.n_outputs).collect();
        let input_len: Vec<usize> = self.specs.iter().map(|s| s.n_inputs).collect();
        let routing = match RoutingTable::build(self.connections.clone(), &output_len, &input_len) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                self.state = ManagerState::Finished;
                return Err(e);
            }
        };
        if let Some(dir) = self.opts.debug_dir.clone() {
            if let Err(e) = dump_routing(&dir, &routing) {
                self.state = ManagerState::Finished;
                return Err(e);
            }
        }

        // 端点分配：显式请求冲突立即失败，已分配部分回收。
        let mut endpoints: Vec<Endpoint> = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            match self.allocator.allocate(spec.port_ctrl, spec.port_data) {
                Ok(ep) => endpoints.push(ep),
                Err(e) => {
                    for ep in endpoints {
                        self.allocator.release(ep);
                    }
                    self.state = ManagerState::Finished;
                    return Err(e);
                }
            }
        }

        // 通道接线：每模块一条控制下行、一条状态上行、一个数据接收端。
        let n = self.specs.len();
        let mut ctrl_txs = Vec::with_capacity(n);
        let mut ctrl_rxs = Vec::with_capacity(n);
        let mut status_txs = Vec::with_capacity(n);
        let mut status_rxs = Vec::with_capacity(n);
        let mut data_txs_all = Vec::with_capacity(n);
        let mut data_rxs = Vec::with_capacity(n);
        for _ in 0..n {
            let (ct, cr) = unbounded::<CtrlMsg>();
            let (st, sr) = unbounded::<StatusMsg>();
            let (dt, dr) = unbounded::<DataMsg>();
            ctrl_txs.push(ct);
            ctrl_rxs.push(cr);
            status_txs.push(st);
            status_rxs.push(sr);
            data_txs_all.push(dt);
            data_rxs.push(dr);
        }

        let mut workers: Vec<Worker> = Vec::with_capacity(n);
        let specs = std::mem::take(&mut self.specs);
        for (idx, spec) in specs.into_iter().enumerate() {
            let id = ModuleId(idx);
            let incoming: HashMap<ModuleId, RoutingEntry> = routing
                .incoming(id)
                .iter()
                .map(|e| (e.src, e.clone()))
                .collect();
            let outgoing = routing.outgoing(id).to_vec();
            let data_txs: HashMap<ModuleId, _> = outgoing
                .iter()
                .map(|e| (e.dst, data_txs_all[e.dst.0].clone()))
                .collect();
            let launch = LaunchInfo {
                module: spec.name.clone(),
                device: spec.device,
                input_file: spec.input_file.clone(),
                output_file: spec.output_file.clone(),
            };
            workers.push(Worker {
                id,
                name: spec.name,
                runner: spec.runner,
                launch,
                incoming,
                outgoing,
                n_inputs: spec.n_inputs,
                n_outputs: spec.n_outputs,
                chans: WorkerChannels {
                    ctrl_rx: ctrl_rxs.remove(0),
                    status_tx: status_txs.remove(0),
                    data_rx: data_rxs.remove(0),
                    data_txs,
                },
            });
        }
        drop(data_txs_all);

        let links: Vec<WorkerLink> = self
            .handles
            .iter()
            .enumerate()
            .map(|(i, h)| WorkerLink {
                id: h.id,
                name: h.name.clone(),
                ctrl_tx: ctrl_txs[i].clone(),
                status_rx: status_rxs[i].clone(),
                state: h.state_slot(),
            })
            .collect();

        info!(modules = n, edges = routing.num_edges(), "启动 worker");
        match spawn_workers(workers, &links, self.opts.launch_timeout) {
            Ok(joins) => {
                for ((handle, join), ep) in self.handles.iter_mut().zip(joins).zip(&endpoints) {
                    handle.join = Some(join);
                    handle.endpoint = Some(*ep);
                }
                self.routing = Some(routing);
                self.links = Some(links);
                self.state = ManagerState::Spawned;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "spawn 失败，已整体回滚");
                for ep in endpoints {
                    self.allocator.release(ep);
                }
                self.state = ManagerState::Finished;
                Err(e)
            }
        }
    }

    /// 广播步预算并放开屏障；立即返回（非阻塞）。
    pub fn start(&mut self, steps: u64) -> Result<(), Error> {
        if self.state != ManagerState::Spawned {
            return Err(Error::Lifecycle {
                method: "start",
                state: self.state,
            });
        }
        let Some(links) = self.links.take() else {
            return Err(Error::Lifecycle {
                method: "start",
                state: self.state,
            });
        };
        self.counter = StepCounter::start(steps);
        let (cancel_tx, cancel_rx) = unbounded::<()>();
        let coord = Coordinator {
            links,
            steps,
            counter: self.counter.mirror(),
            cancel_rx,
        };
        let join = std::thread::Builder::new()
            .name("modsim-coordinator".to_string())
            .spawn(move || coord.run())
            .map_err(|e| Error::config(format!("failed to spawn coordinator thread: {e}")))?;
        self.cancel_tx = Some(cancel_tx);
        self.coord = Some(join);
        self.state = ManagerState::Started;
        info!(steps, "▶️  仿真开始");
        Ok(())
    }

    /// 阻塞等待全部模块完成或任一失败，随后回收线程与端点并进入
    /// FINISHED。成功返回 `Ok(())`；否则返回指明失败模块与步号的错误。
    pub fn wait(&mut self) -> Result<(), Error> {
        if self.state != ManagerState::Started {
            return Err(Error::Lifecycle {
                method: "wait",
                state: self.state,
            });
        }
        let Some(coord) = self.coord.take() else {
            return Err(Error::Lifecycle {
                method: "wait",
                state: self.state,
            });
        };
        let result = match coord.join() {
            Ok(r) => r,
            Err(_) => Err(Error::config("coordinator thread panicked")),
        };
        self.cancel_tx = None;

        // 协调器退出后 worker 必然在有限步内退出；逐个回收。
        for handle in &mut self.handles {
            if let Some(join) = handle.join.take() {
                let _ = join.join();
            }
            if let Some(ep) = handle.endpoint.take() {
                self.allocator.release(ep);
            }
        }
        if result.is_err() {
            // 中止路径：未完成的句柄一律标记失败。
            for handle in &self.handles {
                if handle.state() != ModuleState::Completed {
                    handle.set_state(ModuleState::Failed);
                }
            }
        }
        self.state = ManagerState::Finished;
        match &result {
            Ok(()) => info!(steps = self.counter.current(), "✅ 仿真结束"),
            Err(e) => warn!(error = %e, "仿真以错误结束"),
        }
        result
    }

    /// 请求取消；在下一个步检查点生效。`start` 之前调用是空操作。
    pub fn cancel(&self) {
        if let Some(tx) = &self.cancel_tx {
            let _ = tx.send(());
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// 已全员确认完成的步数（全局步计数器读侧）。
    pub fn current_step(&self) -> u64 {
        self.counter.current()
    }

    pub fn step_counter(&self) -> &StepCounter {
        &self.counter
    }

    pub fn num_modules(&self) -> usize {
        self.handles.len()
    }

    pub fn module_state(&self, id: ModuleId) -> Option<ModuleState> {
        self.handles.get(id.0).map(|h| h.state())
    }

    pub fn module_endpoint(&self, id: ModuleId) -> Option<Endpoint> {
        self.handles.get(id.0).and_then(|h| h.endpoint)
    }

    pub fn handles(&self) -> &[ModuleHandle] {
        &self.handles
    }

    /// `spawn` 后可读的路由表（只读共享）。
    pub fn routing(&self) -> Option<&RoutingTable> {
        self.routing.as_deref()
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        // 已 spawn 未 start 就被丢弃：断开控制通道让 worker 退出。
        if self.state == ManagerState::Spawned {
            self.links = None;
            for handle in &mut self.handles {
                if let Some(join) = handle.join.take() {
                    let _ = join.join();
                }
            }
        }
        // 运行中被丢弃：请求取消并回收线程，避免 worker 悬挂。
        if self.state == ManagerState::Started {
            self.cancel();
            if let Some(coord) = self.coord.take() {
                let _ = coord.join();
            }
            for handle in &mut self.handles {
                if let Some(join) = handle.join.take() {
                    let _ = join.join();
                }
            }
        }
    }
}

/// 把构建好的路由表写入调试目录（`--debug` 的原始行为）。
fn dump_routing(dir: &PathBuf, routing: &RoutingTable) -> Result<(), Error> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::config(format!("create debug dir {}: {e}", dir.display())))?;
    let path = dir.join("routing.json");
    let json = serde_json::to_string_pretty(routing)
        .map_err(|e| Error::config(format!("serialize routing table: {e}")))?;
    std::fs::write(&path, json)
        .map_err(|e| Error::config(format!("write {}: {e}", path.display())))?;
    debug!(path = %path.display(), "已写出路由表调试文件");
    Ok(())
}
