//! 路由表
//!
//! 由全局连接描述一次构建（O(E)），之后按模块 O(1) 查询
//! 入边/出边条目列表；`spawn` 后只读共享。

use super::entry::RoutingEntry;
use crate::error::Error;
use crate::module::ModuleId;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// 静态二部路由表。
#[derive(Debug, Default, Clone, Serialize)]
pub struct RoutingTable {
    /// incoming[m] 为所有以 m 为目标的条目（按构建顺序）。
    incoming: Vec<Vec<RoutingEntry>>,
    /// outgoing[m] 为所有以 m 为源的条目（按构建顺序）。
    outgoing: Vec<Vec<RoutingEntry>>,
}

impl RoutingTable {
    /// 从条目列表构建路由表并校验不变式。
    ///
    /// `output_len[m]` / `input_len[m]` 为各模块声明的输出/输入元素数。
    /// 校验失败（同一目标索引被多个源写入、索引越界、模块编号非法）
    /// 返回 `Error::Configuration`。
    pub fn build(
        entries: Vec<RoutingEntry>,
        output_len: &[usize],
        input_len: &[usize],
    ) -> Result<RoutingTable, Error> {
        let n = input_len.len();
        if output_len.len() != n {
            return Err(Error::config("output_len/input_len length mismatch"));
        }

        let mut incoming: Vec<Vec<RoutingEntry>> = vec![Vec::new(); n];
        let mut outgoing: Vec<Vec<RoutingEntry>> = vec![Vec::new(); n];
        // 每个目标模块已被占用的输入索引，用于唯一性校验。
        let mut claimed: Vec<HashSet<usize>> = vec![HashSet::new(); n];
        // 每个有序模块对至多一条条目（数据面按 (src, dst) 寻址）。
        let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();

        for entry in entries {
            let (ModuleId(s), ModuleId(d)) = (entry.src, entry.dst);
            if s >= n || d >= n {
                return Err(Error::config(format!(
                    "routing entry {} -> {} references unknown module (known: {n})",
                    entry.src, entry.dst
                )));
            }
            if s == d {
                return Err(Error::config(format!(
                    "routing entry {} -> {} connects a module to itself",
                    entry.src, entry.dst
                )));
            }
            if !seen_pairs.insert((s, d)) {
                return Err(Error::config(format!(
                    "duplicate routing entry for pair {} -> {}",
                    entry.src, entry.dst
                )));
            }
            for &(si, di) in &entry.pairs {
                if si >= output_len[s] {
                    return Err(Error::config(format!(
                        "routing entry {} -> {}: source index {si} out of range (outputs={})",
                        entry.src, entry.dst, output_len[s]
                    )));
                }
                if di >= input_len[d] {
                    return Err(Error::config(format!(
                        "routing entry {} -> {}: destination index {di} out of range (inputs={})",
                        entry.src, entry.dst, input_len[d]
                    )));
                }
                if !claimed[d].insert(di) {
                    return Err(Error::config(format!(
                        "destination index {di} of {} written by more than one source",
                        entry.dst
                    )));
                }
            }
            outgoing[s].push(entry.clone());
            incoming[d].push(entry);
        }

        debug!(
            modules = n,
            edges = incoming.iter().map(|v| v.len()).sum::<usize>(),
            "路由表构建完成"
        );
        Ok(RoutingTable { incoming, outgoing })
    }

    /// 模块 m 的入边条目（有序）。
    pub fn incoming(&self, m: ModuleId) -> &[RoutingEntry] {
        &self.incoming[m.0]
    }

    /// 模块 m 的出边条目（有序）。
    pub fn outgoing(&self, m: ModuleId) -> &[RoutingEntry] {
        &self.outgoing[m.0]
    }

    pub fn num_modules(&self) -> usize {
        self.incoming.len()
    }

    /// 全表条目数。
    pub fn num_edges(&self) -> usize {
        self.incoming.iter().map(|v| v.len()).sum()
    }
}
