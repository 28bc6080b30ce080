//! 文档槽位与上传文档
//!
//! 四个固定槽位（ce1 / ce2 / ce3 / rw）以及 pdf / docx 两种格式模式

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, ConfigError, FileError};

/// 文档槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSlot {
    Ce1,
    Ce2,
    Ce3,
    /// 参考文档
    Rw,
}

impl DocumentSlot {
    /// 全部槽位，按展示顺序
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::Ce1,
        DocumentSlot::Ce2,
        DocumentSlot::Ce3,
        DocumentSlot::Rw,
    ];

    /// 三个 CE 槽位
    pub const CE: [DocumentSlot; 3] = [DocumentSlot::Ce1, DocumentSlot::Ce2, DocumentSlot::Ce3];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentSlot::Ce1 => "ce1",
            DocumentSlot::Ce2 => "ce2",
            DocumentSlot::Ce3 => "ce3",
            DocumentSlot::Rw => "rw",
        }
    }
}

impl FromStr for DocumentSlot {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ce1" => Ok(DocumentSlot::Ce1),
            "ce2" => Ok(DocumentSlot::Ce2),
            "ce3" => Ok(DocumentSlot::Ce3),
            "rw" => Ok(DocumentSlot::Rw),
            _ => Err(ConfigError::UnknownSlot(s.to_string())),
        }
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 文件格式模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    #[default]
    Docx,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Docx => "docx",
        }
    }

    /// 上传时使用的 MIME 类型
    pub fn mime_type(self) -> &'static str {
        match self {
            FileFormat::Pdf => "application/pdf",
            FileFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// 检查文件名的扩展名是否与当前格式一致（不区分大小写）
    pub fn matches_file_name(self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.as_str()))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 已上传的文档
///
/// 内容用 `Arc` 共享，同一文档参与多个并发请求时不重复拷贝
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub name: String,
    pub size_bytes: u64,
    pub format: FileFormat,
    pub content: Arc<Vec<u8>>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, format: FileFormat, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            format,
            content: Arc::new(content),
        }
    }

    /// 从磁盘读取文档
    ///
    /// 扩展名必须与 `format` 一致，否则拒绝上传
    pub async fn from_path(path: &Path, format: FileFormat) -> AppResult<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if !format.matches_file_name(&name) {
            return Err(FileError::FormatMismatch {
                file_name: name,
                expected: format,
            }
            .into());
        }

        let content = tokio::fs::read(path)
            .await
            .map_err(|e| FileError::ReadFailed {
                path: path.display().to_string(),
                source: e,
            })?;

        Ok(Self::new(name, format, content))
    }
}
