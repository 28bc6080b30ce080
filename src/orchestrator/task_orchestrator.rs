//! 任务编排器 - 编排层
//!
//! ## 职责
//!
//! 本模块是单个审核会话的入口，持有会话状态并调度任务。
//!
//! ## 核心功能
//!
//! 1. **槽位与格式**：`set_slot` / `set_format`，切换格式会清空全部结果
//! 2. **任务调度**：`run_task` 按分组策略规划请求，委托 `TaskFlow` 并发执行
//! 3. **运行中标记**：调用开始前登记，所有请求结束后由守卫撤销
//! 4. **报告生成**：`generate_report` 独立于结果存储和运行中标记

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::RemoteTaskClient;
use crate::error::{AppResult, TaskError};
use crate::models::{
    DocumentSlot, FileFormat, ReportAction, ReportArtifact, TaskId, UploadedDocument,
};
use crate::services::{InvocationToken, ReportSink, SharedState, SlotResults};
use crate::workflow::{plan_calls, FlowReport, InvocationCtx, SlotSnapshot, TaskFlow};

/// 一次 `run_task` 的结果摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task: TaskId,
    pub token: InvocationToken,
    pub report: FlowReport,
}

/// 任务编排器
pub struct TaskOrchestrator {
    state: SharedState,
    client: Arc<dyn RemoteTaskClient>,
    flow: TaskFlow,
    reports: Arc<dyn ReportSink>,
}

impl TaskOrchestrator {
    pub fn new(
        client: Arc<dyn RemoteTaskClient>,
        reports: Arc<dyn ReportSink>,
        format: FileFormat,
    ) -> Self {
        let state = SharedState::new(format);
        Self {
            flow: TaskFlow::new(client.clone(), state.clone()),
            state,
            client,
            reports,
        }
    }

    // ========== 槽位与格式 ==========

    pub fn format(&self) -> FileFormat {
        self.state.lock().registry.format()
    }

    /// 切换格式模式：清空全部结果，作废未完成的调用，文档保持不变
    pub fn set_format(&self, format: FileFormat) {
        let mut state = self.state.lock();
        if state.registry.format() != format {
            info!("🔄 格式切换: {} → {}", state.registry.format(), format);
        }
        state.switch_format(format);
    }

    pub fn set_slot(&self, slot: DocumentSlot, document: Option<UploadedDocument>) {
        if let Some(doc) = &document {
            info!("📎 {} ← {} ({} 字节)", slot, doc.name, doc.size_bytes);
        }
        self.state.lock().registry.set_slot(slot, document);
    }

    pub fn document(&self, slot: DocumentSlot) -> Option<UploadedDocument> {
        self.state.lock().registry.get(slot).cloned()
    }

    // ========== 读取 ==========

    pub fn get_results(&self, task: TaskId) -> SlotResults {
        self.state.lock().results.get_results(task)
    }

    pub fn get_all_results(&self) -> BTreeMap<TaskId, SlotResults> {
        self.state.lock().results.get_all_results()
    }

    /// 当前至少有一个请求未结束的任务
    pub fn in_flight(&self) -> BTreeSet<TaskId> {
        self.state.lock().in_flight.tasks()
    }

    pub fn is_running(&self, task: TaskId) -> bool {
        self.state.lock().in_flight.contains(task)
    }

    // ========== 任务调度 ==========

    /// 运行一个任务
    ///
    /// 只有前置条件错误会返回 `Err`，此时不发请求也不改任何状态；
    /// 网络错误都转成对应槽位的 Fail 结果。
    pub async fn run_task(&self, task: TaskId) -> Result<TaskOutcome, TaskError> {
        let (ctx, calls) = {
            let mut state = self.state.lock();
            let snapshot: SlotSnapshot = state
                .registry
                .populated()
                .map(|(slot, doc)| (slot, doc.clone()))
                .collect();

            let calls = match plan_calls(task, &snapshot) {
                Ok(calls) => calls,
                Err(e) => {
                    warn!("⚠️ {}", e);
                    return Err(e);
                }
            };

            let token = state.tokens.issue();
            let ctx = InvocationCtx::new(task, state.registry.format(), token);
            state.in_flight.enter(task);
            TaskFlow::mark_loading(&mut state, task, token, &calls);
            (ctx, calls)
        };
        let _guard = InFlightGuard {
            state: self.state.clone(),
            task,
        };

        info!("{} ▶ 开始 {}，{} 个请求", ctx, task.display_name(), calls.len());
        let report = self.flow.execute(&ctx, calls).await;
        info!(
            "{} ■ 完成: 写入 {} 个槽位，丢弃 {} 个过期槽位结果",
            ctx,
            report.written.len(),
            report.discarded
        );

        Ok(TaskOutcome {
            task,
            token: ctx.token,
            report,
        })
    }

    // ========== 报告 ==========

    /// 为槽位生成报告
    ///
    /// 槽位为空时什么也不做，返回 `Ok(None)`
    pub async fn generate_report(
        &self,
        slot: DocumentSlot,
        action: ReportAction,
    ) -> AppResult<Option<PathBuf>> {
        let Some(document) = self.document(slot) else {
            info!("{} 没有文档，跳过报告生成", slot);
            return Ok(None);
        };

        info!("📝 正在为 {} 生成报告...", slot);
        let html = self.client.generate_report(&document).await?;
        let artifact = ReportArtifact::new(slot, action, html);
        let path = self.reports.deliver(&artifact)?;
        Ok(Some(path))
    }
}

/// 运行中标记守卫
///
/// 析构时撤销登记，调用提前返回、panic 或被丢弃时同样生效
struct InFlightGuard {
    state: SharedState,
    task: TaskId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state.lock().in_flight.leave(self.task);
    }
}
