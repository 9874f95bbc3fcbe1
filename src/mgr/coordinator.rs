//! 屏障协调器
//!
//! 每步的控制面核心：等待所有运行中 worker 对同一步号的确认，
//! 全员到齐才推进全局步计数并广播放行；任何 worker 失败或外部
//! 取消都会广播中止并释放所有等待中的对端。

use crate::error::Error;
use crate::launch::WorkerLink;
use crate::module::ModuleState;
use crate::proto::{AbortReason, CtrlMsg, StatusMsg};
use crossbeam_channel::{Receiver, Select};
use tracing::{debug, info, trace, warn};

use super::step_counter::StepCounter;

/// 一次运行的协调器；在独立线程中执行 `run`。
pub(crate) struct Coordinator {
    pub links: Vec<WorkerLink>,
    pub steps: u64,
    pub counter: StepCounter,
    pub cancel_rx: Receiver<()>,
}

/// 等待确认时观察到的一个事件。
enum AckEvent {
    Acked(usize),
    Failure { idx: usize, message: String },
    Cancelled,
}

impl Coordinator {
    pub(crate) fn run(self) -> Result<(), Error> {
        let n = self.links.len();
        info!(workers = n, steps = self.steps, "▶️  广播步预算，屏障开始");
        for link in &self.links {
            let _ = link.ctrl_tx.send(CtrlMsg::Start { steps: self.steps });
        }

        for k in 0..self.steps {
            self.await_step(k)?;
            self.counter.advance_to(k + 1);
            trace!(step = k, "全员确认，放行");
            for link in &self.links {
                let _ = link.ctrl_tx.send(CtrlMsg::Proceed { step: k });
            }
        }

        self.await_done()?;
        info!(steps = self.steps, "✅ 全部模块完成");
        Ok(())
    }

    /// 等待步 k 的全员确认；失败/取消走中止路径。
    fn await_step(&self, k: u64) -> Result<(), Error> {
        let n = self.links.len();
        let mut acked = vec![false; n];
        let mut need = n;
        while need > 0 {
            match self.next_ack_event(k, &acked) {
                AckEvent::Acked(idx) => {
                    acked[idx] = true;
                    need -= 1;
                }
                AckEvent::Failure { idx, message } => {
                    return Err(self.abort_run(k, idx, message));
                }
                AckEvent::Cancelled => {
                    return Err(self.cancel_run(k));
                }
            }
        }
        Ok(())
    }

    /// 在未确认 worker 的状态通道与取消通道上等待下一个事件。
    fn next_ack_event(&self, k: u64, acked: &[bool]) -> AckEvent {
        let mut sel = Select::new();
        let cancel_idx = sel.recv(&self.cancel_rx);
        // select 槽位 -> links 下标。
        let mut slots: Vec<(usize, usize)> = Vec::new();
        for (i, link) in self.links.iter().enumerate() {
            if !acked[i] {
                slots.push((sel.recv(&link.status_rx), i));
            }
        }
        loop {
            let oper = sel.select();
            let oi = oper.index();
            if oi == cancel_idx {
                return match oper.recv(&self.cancel_rx) {
                    // 管理器被 drop 时取消通道断开：同样按取消处理。
                    Ok(()) | Err(_) => AckEvent::Cancelled,
                };
            }
            let Some(&(_, i)) = slots.iter().find(|(s, _)| *s == oi) else {
                unreachable!("select returned unknown slot");
            };
            let link = &self.links[i];
            return match oper.recv(&link.status_rx) {
                Ok(StatusMsg::Ack { step, .. }) if step == k => AckEvent::Acked(i),
                Ok(StatusMsg::Ack { step, .. }) => AckEvent::Failure {
                    idx: i,
                    message: format!("acknowledged step {step} while barrier is at {k}"),
                },
                Ok(StatusMsg::Failed { message, .. }) => AckEvent::Failure { idx: i, message },
                Ok(StatusMsg::Done { .. }) => AckEvent::Failure {
                    idx: i,
                    message: format!("reported done before step budget at step {k}"),
                },
                Ok(StatusMsg::Ready { .. }) => continue,
                Err(_) => AckEvent::Failure {
                    idx: i,
                    message: "worker exited unexpectedly".to_string(),
                },
            };
        }
    }

    /// 等待所有 worker 的 Done。此时最后一步已全员确认，不再受理取消。
    fn await_done(&self) -> Result<(), Error> {
        for (i, link) in self.links.iter().enumerate() {
            loop {
                match link.status_rx.recv() {
                    Ok(StatusMsg::Done { .. }) => {
                        link.set_state(ModuleState::Completed);
                        debug!(module = %link.name, "模块完成");
                        break;
                    }
                    Ok(StatusMsg::Failed { message, .. }) => {
                        return Err(self.abort_run(self.steps, i, message));
                    }
                    Ok(_) => continue,
                    Err(_) => {
                        return Err(self.abort_run(
                            self.steps,
                            i,
                            "worker exited without reporting done".to_string(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// 失败路径：广播 PeerFailed 释放所有等待者，短暂收集其余失败，
    /// 返回聚合错误。
    fn abort_run(&self, step: u64, first_idx: usize, message: String) -> Error {
        let first = &self.links[first_idx];
        warn!(module = %first.name, step, message, "worker 失败，中止屏障");
        first.set_state(ModuleState::Failed);
        for link in &self.links {
            let _ = link.ctrl_tx.send(CtrlMsg::Abort {
                reason: AbortReason::PeerFailed {
                    module: first.name.clone(),
                },
            });
        }

        let mut failed = vec![first.name.clone()];
        // 非阻塞排空：聚合同一时刻的其它失败。
        for (i, link) in self.links.iter().enumerate() {
            if i == first_idx {
                continue;
            }
            while let Ok(msg) = link.status_rx.try_recv() {
                if let StatusMsg::Failed { .. } = msg {
                    link.set_state(ModuleState::Failed);
                    failed.push(link.name.clone());
                    break;
                }
            }
        }
        Error::PeersFailed { failed, step }
    }

    /// 取消路径：广播 Cancelled；worker 在下一个检查点退出。
    fn cancel_run(&self, step: u64) -> Error {
        info!(step, "收到取消，广播中止");
        for link in &self.links {
            let _ = link.ctrl_tx.send(CtrlMsg::Abort {
                reason: AbortReason::Cancelled,
            });
        }
        Error::Cancelled { step }
    }
}
