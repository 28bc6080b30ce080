//! # Doc Audit
//!
//! 把 CE1 / CE2 / CE3 / RW 四个文档提交给远程分析服务，运行固定目录中的校验与对比任务，
//! 并记录每个 (任务, 槽位) 的 通过 / 未通过 / 运行中 状态。
//!
//! ## 架构设计
//!
//! ### ① 模型层（Models）
//! - `models/` - 槽位、格式、任务目录、结果与响应判定
//! - `TaskId` - 每个任务的分组策略和端点在编译期确定
//!
//! ### ② 客户端（Clients）
//! - `clients/` - 远程分析服务，只暴露"上传并取回结果"的能力
//! - `RemoteTaskClient` - 编排层依赖的 trait
//!
//! ### ③ 业务能力层（Services）
//! - `SlotRegistry` - 槽位与格式
//! - `ResultStore` - 任务 → 槽位 → 结果
//! - `InvocationTokens` / `InFlightTracker` - 调用令牌与运行中任务
//! - `ReportWriter` - 报告输出
//!
//! ### ④ 流程层（Workflow）
//! - `TaskFlow` - 一次任务调用：规划请求 → 标记 Loading → 并发请求 → 写入结果
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/task_orchestrator` - 会话状态持有者，`run_task` / `generate_report`
//! - `orchestrator/batch_processor` - 按清单批量运行

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

pub use utils::logging as logger;

// 重新导出常用类型
pub use clients::{HttpAuditClient, RemoteTaskClient};
pub use config::Config;
pub use error::{AppError, AppResult, TaskError};
pub use models::{
    DocumentSlot, FileFormat, ReportAction, TaskId, TaskResult, TaskStatus, UploadedDocument,
};
pub use orchestrator::{App, TaskOrchestrator, TaskOutcome};
pub use services::{ReportSink, ReportWriter};
