//! worker step 循环
//!
//! 每个模块在自己的线程里执行：本地计算 → 沿出边发送本步输出 →
//! 收齐所有入边数据 → 向协调器确认 → 等待全员放行。任何阶段收到
//! Abort 都在当前检查点退出，绝不悬挂。

use crate::module::{LaunchInfo, ModuleId, StepModule};
use crate::proto::{CtrlMsg, DataMsg, StatusMsg};
use crate::route::RoutingEntry;
use crossbeam_channel::select;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, trace, warn};

use super::channels::WorkerChannels;

/// 一个待运行的 worker：模块实现 + 路由切片 + 通道束。
pub(crate) struct Worker {
    pub id: ModuleId,
    pub name: String,
    pub runner: Box<dyn StepModule>,
    pub launch: LaunchInfo,
    /// 入边：源模块 -> 路由条目（每个有序模块对至多一条）。
    pub incoming: HashMap<ModuleId, RoutingEntry>,
    pub outgoing: Vec<RoutingEntry>,
    pub n_inputs: usize,
    pub n_outputs: usize,
    pub chans: WorkerChannels,
}

impl Worker {
    /// worker 线程入口。
    pub(crate) fn run(self) {
        let Worker {
            id,
            name,
            mut runner,
            launch,
            incoming,
            outgoing,
            n_inputs,
            n_outputs,
            chans,
        } = self;
        let WorkerChannels {
            ctrl_rx,
            status_tx,
            data_rx,
            data_txs,
        } = chans;
        let span = tracing::info_span!("worker", module = %name);
        let _guard = span.enter();

        // 第 0 步使用全零输入缓冲。
        let mut inputs = vec![0.0_f64; n_inputs];
        let mut outputs = vec![0.0_f64; n_outputs];

        if let Err(e) = runner.on_launch(&launch) {
            warn!(error = %e, "模块启动失败");
            let _ = status_tx.send(StatusMsg::Failed {
                module: id,
                step: 0,
                message: e.to_string(),
            });
            return;
        }

        // 就绪握手：打开控制端点并上报。
        if status_tx.send(StatusMsg::Ready { module: id }).is_err() {
            return;
        }
        let steps = loop {
            match ctrl_rx.recv() {
                Ok(CtrlMsg::Start { steps }) => break steps,
                Ok(CtrlMsg::Proceed { .. }) => continue,
                Ok(CtrlMsg::Abort { reason }) => {
                    debug!(?reason, "启动前收到中止");
                    return;
                }
                Err(_) => return,
            }
        };
        debug!(steps, "收到步预算");

        for k in 0..steps {
            // 本地计算一步。
            if let Err(e) = runner.step(k, &inputs, &mut outputs) {
                warn!(step = k, error = %e, "模块计算失败");
                let _ = status_tx.send(StatusMsg::Failed {
                    module: id,
                    step: k,
                    message: e.to_string(),
                });
                return;
            }

            // 沿出边按路由条目聚集并发送本步输出。
            for entry in &outgoing {
                let values: Vec<f64> = entry.pairs.iter().map(|&(si, _)| outputs[si]).collect();
                if let Some(tx) = data_txs.get(&entry.dst) {
                    // 发送失败说明接收端已退出；中止由控制面广播。
                    let _ = tx.send(DataMsg {
                        src: id,
                        step: k,
                        values,
                    });
                }
            }

            // 收齐所有入边数据；同时监听控制面，对端失败时被释放而非悬挂。
            let mut pending: HashSet<ModuleId> = incoming.keys().copied().collect();
            while !pending.is_empty() {
                select! {
                    recv(data_rx) -> msg => match msg {
                        Ok(msg) => {
                            match scatter(&incoming, &mut inputs, k, &msg) {
                                Ok(src) => {
                                    trace!(step = k, %src, "收到入边数据");
                                    pending.remove(&src);
                                }
                                Err(why) => {
                                    let _ = status_tx.send(StatusMsg::Failed {
                                        module: id,
                                        step: k,
                                        message: why,
                                    });
                                    return;
                                }
                            }
                        }
                        Err(_) => return,
                    },
                    recv(ctrl_rx) -> msg => match msg {
                        Ok(CtrlMsg::Abort { reason }) => {
                            debug!(step = k, ?reason, "屏障中止");
                            return;
                        }
                        Ok(_) => {}
                        Err(_) => return,
                    },
                }
            }

            // 向协调器确认本步，并等待全员放行。
            if status_tx.send(StatusMsg::Ack { module: id, step: k }).is_err() {
                return;
            }
            loop {
                match ctrl_rx.recv() {
                    Ok(CtrlMsg::Proceed { step }) if step == k => break,
                    Ok(CtrlMsg::Proceed { .. }) | Ok(CtrlMsg::Start { .. }) => continue,
                    Ok(CtrlMsg::Abort { reason }) => {
                        debug!(step = k, ?reason, "放行等待中收到中止");
                        return;
                    }
                    Err(_) => return,
                }
            }
        }

        let _ = status_tx.send(StatusMsg::Done { module: id });
        info!(steps, "worker 完成");
    }
}

/// 按路由条目把一条数据消息散布到输入缓冲；返回源模块编号。
fn scatter(
    incoming: &HashMap<ModuleId, RoutingEntry>,
    inputs: &mut [f64],
    step: u64,
    msg: &DataMsg,
) -> Result<ModuleId, String> {
    let Some(entry) = incoming.get(&msg.src) else {
        return Err(format!("unexpected data from {} (no routing entry)", msg.src));
    };
    if msg.step != step {
        return Err(format!(
            "data from {} tagged step {} while at step {step}",
            msg.src, msg.step
        ));
    }
    if msg.values.len() != entry.pairs.len() {
        return Err(format!(
            "data from {} carries {} values, routing entry has {} pairs",
            msg.src,
            msg.values.len(),
            entry.pairs.len()
        ));
    }
    for (i, &(_, di)) in entry.pairs.iter().enumerate() {
        inputs[di] = msg.values[i];
    }
    Ok(msg.src)
}
