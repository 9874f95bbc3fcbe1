//! 启动监督器
//!
//! 把 worker 变成运行中的线程：逐个启动、在统一的截止时间内等待
//! 就绪握手；任何一个失败则中止并回收所有已启动线程（全有或全无），
//! 再向调用者返回单个错误。

use crate::error::Error;
use crate::module::ModuleState;
use crate::proto::{AbortReason, CtrlMsg, StatusMsg};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::channels::WorkerLink;
use super::worker::Worker;

/// 默认启动握手超时。
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(5);

/// 启动全部 worker 并完成就绪握手。
///
/// 成功时所有链接对应的状态槽为 `Running`，返回各线程的 join 句柄
/// （与 `links` 同序）。失败时已启动的线程全部收到中止并被 join，
/// 状态槽置为 `Failed`，返回 `Error::LaunchTimeout`。
pub(crate) fn spawn_workers(
    workers: Vec<Worker>,
    links: &[WorkerLink],
    timeout: Duration,
) -> Result<Vec<JoinHandle<()>>, Error> {
    debug_assert_eq!(workers.len(), links.len());
    let mut joins: Vec<JoinHandle<()>> = Vec::with_capacity(workers.len());

    for worker in workers {
        let name = worker.name.clone();
        links[joins.len()].set_state(ModuleState::Launching);
        let handle = std::thread::Builder::new()
            .name(format!("modsim-{name}"))
            .spawn(move || worker.run());
        match handle {
            Ok(h) => joins.push(h),
            Err(e) => {
                warn!(module = %name, error = %e, "worker 线程创建失败");
                rollback(links, &mut joins, &name);
                return Err(Error::LaunchTimeout { module: name });
            }
        }
    }

    // 统一截止时间：所有握手共享同一个超时预算。
    let deadline = Instant::now() + timeout;
    for link in links {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match link.status_rx.recv_timeout(remaining) {
            Ok(StatusMsg::Ready { .. }) => {
                link.set_state(ModuleState::Running);
                debug!(%link.id, module = %link.name, "worker 就绪");
            }
            Ok(StatusMsg::Failed { message, .. }) => {
                warn!(module = %link.name, message, "worker 启动阶段失败");
                rollback(links, &mut joins, &link.name);
                return Err(Error::LaunchTimeout {
                    module: link.name.clone(),
                });
            }
            Ok(other) => {
                // 握手前不应出现 Ack/Done。
                warn!(module = %link.name, ?other, "握手期间收到非预期消息");
                rollback(links, &mut joins, &link.name);
                return Err(Error::LaunchTimeout {
                    module: link.name.clone(),
                });
            }
            Err(_) => {
                warn!(module = %link.name, "worker 未在超时内就绪");
                rollback(links, &mut joins, &link.name);
                return Err(Error::LaunchTimeout {
                    module: link.name.clone(),
                });
            }
        }
    }

    info!(workers = links.len(), "全部 worker 就绪");
    Ok(joins)
}

/// 中止并回收所有已启动线程；调用后不留下任何仍在运行的 worker。
fn rollback(links: &[WorkerLink], joins: &mut Vec<JoinHandle<()>>, failed: &str) {
    for link in links {
        let _ = link.ctrl_tx.send(CtrlMsg::Abort {
            reason: AbortReason::PeerFailed {
                module: failed.to_string(),
            },
        });
    }
    for join in joins.drain(..) {
        let _ = join.join();
    }
    for link in links {
        link.set_state(ModuleState::Failed);
    }
    debug!(failed, "启动回滚完成");
}
