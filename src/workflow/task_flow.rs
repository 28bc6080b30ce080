//! 任务处理流程 - 流程层
//!
//! 核心职责：定义"一次任务调用"的完整处理流程
//!
//! 1. 按分组策略从槽位快照规划请求（纯函数，不改任何状态）
//! 2. 把所有目标槽位标记为 Loading
//! 3. 同时发出全部请求，等待全部结束（不论成败）
//! 4. 每个请求结束后只写它负责、且仍归本次调用所有的槽位；已被更新调用认领的槽位直接丢弃

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::clients::RemoteTaskClient;
use crate::error::TaskError;
use crate::models::verdict::response_message;
use crate::models::{
    DocumentSlot, GroupingStrategy, ResponseShape, TaskId, TaskResult, UploadedDocument,
};
use crate::services::{AuditState, InvocationToken, SharedState};
use crate::workflow::invocation_ctx::InvocationCtx;

/// 调用时刻的槽位快照
pub type SlotSnapshot = BTreeMap<DocumentSlot, UploadedDocument>;

/// 请求内容
#[derive(Debug, Clone)]
pub enum CallPayload {
    Single(UploadedDocument),
    Group(Vec<(&'static str, UploadedDocument)>),
}

/// 规划好的一次请求，以及它的结果要写入的槽位
#[derive(Debug, Clone)]
pub struct PlannedCall {
    pub payload: CallPayload,
    pub targets: Vec<DocumentSlot>,
}

/// 按任务的分组策略规划请求
///
/// 成对对比缺少 RW 文档时返回前置条件错误
pub fn plan_calls(task: TaskId, snapshot: &SlotSnapshot) -> Result<Vec<PlannedCall>, TaskError> {
    match task.strategy() {
        GroupingStrategy::Independent => Ok(snapshot
            .iter()
            .map(|(slot, doc)| PlannedCall {
                payload: CallPayload::Single(doc.clone()),
                targets: vec![*slot],
            })
            .collect()),

        GroupingStrategy::PairwiseAgainstReference => {
            let reference = snapshot
                .get(&DocumentSlot::Rw)
                .ok_or_else(|| TaskError::missing_slot(task, DocumentSlot::Rw))?;

            Ok(DocumentSlot::CE
                .iter()
                .filter_map(|slot| snapshot.get(slot).map(|doc| (*slot, doc)))
                .map(|(slot, doc)| PlannedCall {
                    payload: CallPayload::Group(vec![
                        ("file_1", doc.clone()),
                        ("file_2", reference.clone()),
                    ]),
                    targets: vec![slot],
                })
                .collect())
        }

        GroupingStrategy::GroupConsistency => {
            let ce1 = snapshot.get(&DocumentSlot::Ce1);
            let ce2 = snapshot.get(&DocumentSlot::Ce2);
            let ce3 = snapshot.get(&DocumentSlot::Ce3);
            let rw = snapshot.get(&DocumentSlot::Rw);
            let mut calls = Vec::new();

            // 阶段一：三个 CE 共用一个判定
            if let (Some(ce1), Some(ce2), Some(ce3)) = (ce1, ce2, ce3) {
                calls.push(PlannedCall {
                    payload: CallPayload::Group(vec![
                        ("file_1", ce1.clone()),
                        ("file_2", ce2.clone()),
                        ("file_3", ce3.clone()),
                    ]),
                    targets: DocumentSlot::CE.to_vec(),
                });
            }

            // 阶段二：ce1、ce2 作为上下文检查 RW
            if let (Some(ce1), Some(ce2), Some(rw)) = (ce1, ce2, rw) {
                calls.push(PlannedCall {
                    payload: CallPayload::Group(vec![
                        ("file_1", ce1.clone()),
                        ("file_2", ce2.clone()),
                        ("file_3", rw.clone()),
                    ]),
                    targets: vec![DocumentSlot::Rw],
                });
            }

            Ok(calls)
        }
    }
}

/// 一次调用的执行结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowReport {
    /// 发出的请求数
    pub calls: usize,
    /// 写入终态结果的槽位
    pub written: Vec<DocumentSlot>,
    /// 已被更新调用认领而丢弃的槽位数
    pub discarded: usize,
}

/// 任务处理流程
///
/// - 不持有槽位数据，只读调用时的快照
/// - 请求失败就地转成 Fail 结果，不会向上传播
pub struct TaskFlow {
    client: Arc<dyn RemoteTaskClient>,
    state: SharedState,
}

impl TaskFlow {
    pub fn new(client: Arc<dyn RemoteTaskClient>, state: SharedState) -> Self {
        Self { client, state }
    }

    /// 把计划中的全部目标槽位标记为 Loading，并由 `token` 认领
    ///
    /// 调用方需在签发令牌的同一次加锁内完成，这里直接接收锁内状态
    pub fn mark_loading(
        state: &mut AuditState,
        task: TaskId,
        token: InvocationToken,
        calls: &[PlannedCall],
    ) {
        for slot in calls.iter().flat_map(|call| call.targets.iter()) {
            state.tokens.claim(task, *slot, token);
            state.results.set_result(task, *slot, TaskResult::loading());
        }
    }

    /// 同时发出全部请求并等待全部结束
    pub async fn execute(&self, ctx: &InvocationCtx, calls: Vec<PlannedCall>) -> FlowReport {
        let pending = calls.iter().map(|call| self.settle(ctx, call));
        let settled = join_all(pending).await;

        let mut report = FlowReport {
            calls: calls.len(),
            ..Default::default()
        };
        for (written, discarded) in settled {
            report.written.extend(written);
            report.discarded += discarded;
        }
        report
    }

    /// 发出一个请求并记录结果，返回 (写入的槽位, 丢弃的槽位数)
    async fn settle(&self, ctx: &InvocationCtx, call: &PlannedCall) -> (Vec<DocumentSlot>, usize) {
        let response = match &call.payload {
            CallPayload::Single(document) => {
                self.client
                    .run_single(ctx.task, ctx.format, document)
                    .await
            }
            CallPayload::Group(documents) => {
                self.client
                    .run_group(ctx.task, ctx.format, documents)
                    .await
            }
        };

        let result = match response {
            Ok(payload) => Self::verdict(ctx.task, payload),
            Err(e) => TaskResult::failed(e.to_string()),
        };

        self.record(ctx, &call.targets, result)
    }

    fn verdict(task: TaskId, payload: JsonValue) -> TaskResult {
        let signal = ResponseShape::for_task(task).decode(&payload);
        debug!("任务 {} 判定信号: {:?}", task, signal);
        TaskResult::settled(signal.passed(), response_message(&payload), payload)
    }

    fn record(
        &self,
        ctx: &InvocationCtx,
        targets: &[DocumentSlot],
        result: TaskResult,
    ) -> (Vec<DocumentSlot>, usize) {
        let mut state = self.state.lock();
        let mut written = Vec::with_capacity(targets.len());
        let mut discarded = 0;

        for slot in targets {
            if !state.tokens.owns(ctx.task, *slot, ctx.token) {
                debug!("{} {} 已被更新的调用认领，丢弃结果", ctx, slot);
                discarded += 1;
                continue;
            }
            if result.success {
                info!("{} ✓ {} 通过", ctx, slot);
            } else {
                warn!(
                    "{} ✗ {} 未通过: {}",
                    ctx,
                    slot,
                    result.message.as_deref().unwrap_or("-")
                );
            }
            state.results.set_result(ctx.task, *slot, result.clone());
            written.push(*slot);
        }
        (written, discarded)
    }
}
