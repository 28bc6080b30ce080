use thiserror::Error;

use crate::models::{DocumentSlot, FileFormat, TaskId};

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 任务执行错误
    #[error("任务错误: {0}")]
    Task(#[from] TaskError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 任务相关错误
#[derive(Debug, Error)]
pub enum TaskError {
    /// 运行前缺少必需的文档，不会发出任何请求
    #[error("{message}")]
    Precondition {
        task: TaskId,
        missing: DocumentSlot,
        message: String,
    },
    /// 任务标识无法识别，属于配置问题
    #[error("未知任务: {task}")]
    UnknownTask { task: String },
    /// 网络请求失败（连接、超时、非 2xx 响应）
    #[error("请求失败 ({endpoint}): {message}")]
    Network { endpoint: String, message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 扩展名与当前格式模式不一致
    #[error("文件 {file_name} 不是 {expected} 文件")]
    FormatMismatch {
        file_name: String,
        expected: FileFormat,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 清单中出现无法识别的槽位
    #[error("未知槽位: {0}")]
    UnknownSlot(String),
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

// ========== 便捷构造函数 ==========

impl TaskError {
    /// 创建网络错误
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        TaskError::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 创建缺少参考文档的前置条件错误
    pub fn missing_slot(task: TaskId, missing: DocumentSlot) -> Self {
        TaskError::Precondition {
            task,
            missing,
            message: format!(
                "{} 需要先上传 {} 文档",
                task.display_name(),
                missing.as_str().to_uppercase()
            ),
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, TaskError::Precondition { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
