//! 调用令牌与运行中任务
//!
//! - 每次 `run_task` 领取一个递增令牌，标记 Loading 时认领对应的 (任务, 槽位) 单元格
//! - 结果只能写入仍归本次调用所有的单元格；被更新的调用认领后，旧结果直接丢弃
//! - 运行中任务按调用次数计数，重叠调用全部结束后才算空闲

use std::collections::{BTreeSet, HashMap};

use crate::models::{DocumentSlot, TaskId};

/// 一次调用的令牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvocationToken(u64);

impl InvocationToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct InvocationTokens {
    next: u64,
    /// 每个单元格最近一次被哪个调用标记为 Loading
    owners: HashMap<(TaskId, DocumentSlot), InvocationToken>,
}

impl InvocationTokens {
    /// 签发新令牌
    pub fn issue(&mut self) -> InvocationToken {
        self.next += 1;
        InvocationToken(self.next)
    }

    /// 由 `token` 认领单元格，之前的认领随即失效
    pub fn claim(&mut self, task: TaskId, slot: DocumentSlot, token: InvocationToken) {
        self.owners.insert((task, slot), token);
    }

    /// 单元格当前是否仍归 `token` 所有
    pub fn owns(&self, task: TaskId, slot: DocumentSlot, token: InvocationToken) -> bool {
        self.owners.get(&(task, slot)) == Some(&token)
    }

    /// 使所有认领失效（格式切换时调用）
    pub fn invalidate_all(&mut self) {
        self.owners.clear();
    }
}

#[derive(Debug, Default)]
pub struct InFlightTracker {
    counts: HashMap<TaskId, usize>,
}

impl InFlightTracker {
    pub fn enter(&mut self, task: TaskId) {
        *self.counts.entry(task).or_insert(0) += 1;
    }

    pub fn leave(&mut self, task: TaskId) {
        if let Some(count) = self.counts.get_mut(&task) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&task);
            }
        }
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.counts.contains_key(&task)
    }

    pub fn tasks(&self) -> BTreeSet<TaskId> {
        self.counts.keys().copied().collect()
    }
}
