//! 结果存储 - 业务能力层
//!
//! 任务 → 槽位 → 结果 的映射。写入只通过 `set_result`，每次只覆盖一个单元格。

use std::collections::BTreeMap;

use crate::models::{DocumentSlot, TaskId, TaskResult};

pub type SlotResults = BTreeMap<DocumentSlot, TaskResult>;

#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    results: BTreeMap<TaskId, SlotResults>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖一个 (任务, 槽位) 单元格，其他单元格不受影响
    pub fn set_result(&mut self, task: TaskId, slot: DocumentSlot, result: TaskResult) {
        self.results.entry(task).or_default().insert(slot, result);
    }

    pub fn get_results(&self, task: TaskId) -> SlotResults {
        self.results.get(&task).cloned().unwrap_or_default()
    }

    pub fn get_result(&self, task: TaskId, slot: DocumentSlot) -> Option<&TaskResult> {
        self.results.get(&task).and_then(|slots| slots.get(&slot))
    }

    pub fn get_all_results(&self) -> BTreeMap<TaskId, SlotResults> {
        self.results.clone()
    }

    pub fn reset(&mut self) {
        self.results.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.results.values().all(BTreeMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    #[test]
    fn test_set_result_touches_one_cell() {
        let mut store = ResultStore::new();
        store.set_result(TaskId::Grammar, DocumentSlot::Ce1, TaskResult::loading());
        store.set_result(TaskId::Grammar, DocumentSlot::Ce2, TaskResult::failed("boom"));
        store.set_result(
            TaskId::TitleValidation,
            DocumentSlot::Ce1,
            TaskResult::loading(),
        );

        store.set_result(
            TaskId::Grammar,
            DocumentSlot::Ce1,
            TaskResult::settled(true, None, serde_json::json!({"status": "pass"})),
        );

        let grammar = store.get_results(TaskId::Grammar);
        assert_eq!(grammar[&DocumentSlot::Ce1].status, TaskStatus::Pass);
        assert_eq!(grammar[&DocumentSlot::Ce2].status, TaskStatus::Fail);
        assert_eq!(
            store
                .get_result(TaskId::TitleValidation, DocumentSlot::Ce1)
                .map(|r| r.status),
            Some(TaskStatus::Loading)
        );
        assert_eq!(store.get_all_results().len(), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = ResultStore::new();
        store.set_result(TaskId::Grammar, DocumentSlot::Rw, TaskResult::loading());
        assert!(!store.is_empty());
        store.reset();
        assert!(store.is_empty());
        assert!(store.get_results(TaskId::Grammar).is_empty());
    }
}
