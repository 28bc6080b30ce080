//! 任务调用上下文
//!
//! 封装"这是哪个任务的第几次调用、用的什么格式"这一信息

use std::fmt::Display;

use crate::models::{FileFormat, TaskId};
use crate::services::InvocationToken;

/// 一次 `run_task` 调用的上下文
#[derive(Debug, Clone, Copy)]
pub struct InvocationCtx {
    pub task: TaskId,
    /// 发起调用时的格式模式
    pub format: FileFormat,
    pub token: InvocationToken,
}

impl InvocationCtx {
    pub fn new(task: TaskId, format: FileFormat, token: InvocationToken) -> Self {
        Self {
            task,
            format,
            token,
        }
    }
}

impl Display for InvocationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[任务 {} #{} 格式 {}]",
            self.task,
            self.token.value(),
            self.format
        )
    }
}
