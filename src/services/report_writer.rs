//! 报告输出服务 - 业务能力层
//!
//! 只负责把生成好的 HTML 报告交给用户，不关心报告怎么生成

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppResult, FileError};
use crate::models::{ReportAction, ReportArtifact};

/// 报告交付方式
pub trait ReportSink: Send + Sync {
    /// 交付报告，返回报告所在位置
    fn deliver(&self, artifact: &ReportArtifact) -> AppResult<PathBuf>;
}

/// 写入本地目录的报告输出
///
/// - 下载：`<report_dir>/<file_name>`
/// - 查看：`<report_dir>/preview/<file_name>`，并在日志中给出打开路径
pub struct ReportWriter {
    report_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    pub fn target_path(&self, artifact: &ReportArtifact) -> PathBuf {
        match artifact.action {
            ReportAction::Download => self.report_dir.join(&artifact.file_name),
            ReportAction::View => self.report_dir.join("preview").join(&artifact.file_name),
        }
    }
}

impl ReportSink for ReportWriter {
    fn deliver(&self, artifact: &ReportArtifact) -> AppResult<PathBuf> {
        let path = self.target_path(artifact);
        debug!(
            "写入报告: 槽位 {} | 大小: {} 字节",
            artifact.slot,
            artifact.html.len()
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_failed(parent, e))?;
        }
        fs::write(&path, artifact.html.as_bytes()).map_err(|e| write_failed(&path, e))?;

        match artifact.action {
            ReportAction::Download => info!("📄 报告已保存: {}", path.display()),
            ReportAction::View => info!("👁 在浏览器中打开报告: file://{}", path.display()),
        }

        Ok(path)
    }
}

fn write_failed(path: &Path, source: std::io::Error) -> FileError {
    FileError::WriteFailed {
        path: path.display().to_string(),
        source,
    }
}
