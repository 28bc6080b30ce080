use serde::Serialize;
use serde_json::Value as JsonValue;

/// 单元格状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Loading,
    Pass,
    Fail,
}

impl TaskStatus {
    /// Pass / Fail 为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Pass | TaskStatus::Fail)
    }

    /// 结果表里的标记（Q = 合格，NQ = 不合格）
    pub fn badge(self) -> &'static str {
        match self {
            TaskStatus::Pending => "-",
            TaskStatus::Loading => "...",
            TaskStatus::Pass => "Q",
            TaskStatus::Fail => "NQ",
        }
    }
}

/// (任务, 槽位) 的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub status: TaskStatus,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl TaskResult {
    pub fn loading() -> Self {
        Self {
            status: TaskStatus::Loading,
            success: false,
            message: None,
            details: None,
        }
    }

    /// 由服务返回的判定构造终态结果
    pub fn settled(success: bool, message: Option<String>, details: JsonValue) -> Self {
        Self {
            status: if success {
                TaskStatus::Pass
            } else {
                TaskStatus::Fail
            },
            success,
            message,
            details: Some(details),
        }
    }

    /// 请求失败时的终态结果
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Fail,
            success: false,
            message: Some(message.into()),
            details: None,
        }
    }
}

/// 运行统计
#[derive(Debug, Default)]
pub struct RunStats {
    pub tasks: usize,
    /// 未运行的任务数（缺少前置文档）
    pub skipped: usize,
    pub pass: usize,
    pub fail: usize,
}
