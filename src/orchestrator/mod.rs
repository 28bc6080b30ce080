//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量任务处理器
//! - 管理应用生命周期（初始化、运行）
//! - 按清单上传文档、批量运行任务、生成报告
//! - 控制并发数量
//!
//! ### `task_orchestrator` - 任务编排器
//! - 持有会话状态（槽位、结果、令牌、运行中任务）
//! - `run_task`：规划请求并委托 `TaskFlow` 执行
//! - `generate_report`：报告生成
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<TaskId>)
//!     ↓
//! task_orchestrator (处理单个 TaskId)
//!     ↓
//! workflow::TaskFlow (处理单次调用的全部请求)
//!     ↓
//! services (能力层：槽位 / 结果 / 令牌 / 报告输出)
//!     ↓
//! clients (远程分析服务)
//! ```

pub mod batch_processor;
pub mod task_orchestrator;

// 重新导出主要类型
pub use batch_processor::App;
pub use task_orchestrator::{TaskOrchestrator, TaskOutcome};
