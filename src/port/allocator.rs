//! 端口分配器
//!
//! 在一个管理器生命周期内保证分配互不重复；未指定时取最小空闲
//! 端口号，保证测试可复现。

use super::endpoint::Endpoint;
use crate::error::Error;
use std::collections::BTreeSet;
use tracing::trace;

/// 默认起始端口号。
pub const DEFAULT_PORT_BASE: u16 = 6000;

/// 端口分配器。
#[derive(Debug, Clone)]
pub struct PortAllocator {
    base: u16,
    in_use: BTreeSet<u16>,
}

impl Default for PortAllocator {
    fn default() -> Self {
        PortAllocator::new(DEFAULT_PORT_BASE)
    }
}

impl PortAllocator {
    pub fn new(base: u16) -> PortAllocator {
        PortAllocator {
            base,
            in_use: BTreeSet::new(),
        }
    }

    /// 分配一对端点。显式请求若已占用返回 `Error::PortInUse`；
    /// 未指定时从 `base` 起取最小空闲号。
    pub fn allocate(
        &mut self,
        req_ctrl: Option<u16>,
        req_data: Option<u16>,
    ) -> Result<Endpoint, Error> {
        // 先处理显式请求，失败时不留下半分配状态。
        let ctrl = self.claim(req_ctrl)?;
        let data = match self.claim(req_data) {
            Ok(p) => p,
            Err(e) => {
                self.in_use.remove(&ctrl);
                return Err(e);
            }
        };
        let ep = Endpoint { ctrl, data };
        trace!(%ep, "分配端点");
        Ok(ep)
    }

    fn claim(&mut self, explicit: Option<u16>) -> Result<u16, Error> {
        match explicit {
            Some(port) => {
                if !self.in_use.insert(port) {
                    return Err(Error::PortInUse { port });
                }
                Ok(port)
            }
            None => {
                let mut cand = self.base;
                while self.in_use.contains(&cand) {
                    cand = cand
                        .checked_add(1)
                        .ok_or_else(|| Error::config("port range exhausted"))?;
                }
                self.in_use.insert(cand);
                Ok(cand)
            }
        }
    }

    /// 释放一对端点（`wait`/teardown 时调用）。
    pub fn release(&mut self, ep: Endpoint) {
        self.in_use.remove(&ep.ctrl);
        self.in_use.remove(&ep.data);
    }

    pub fn num_in_use(&self) -> usize {
        self.in_use.len()
    }
}
