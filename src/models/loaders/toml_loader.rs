use crate::error::{ConfigError, TaskError};
use crate::models::{DocumentSlot, FileFormat, ReportAction, TaskId};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 审核清单
///
/// 描述一次审核要上传哪些文档、跑哪些任务、生成哪些报告
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditManifest {
    #[serde(default)]
    pub format: FileFormat,
    /// 为空时运行完整任务目录
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub slots: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub reports: Vec<ReportRequest>,
    /// 清单文件所在路径，用于解析相对路径
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

/// 报告请求
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub slot: DocumentSlot,
    pub action: ReportAction,
}

impl AuditManifest {
    /// 解析任务列表
    pub fn task_ids(&self) -> Result<Vec<TaskId>, TaskError> {
        if self.tasks.is_empty() {
            return Ok(TaskId::ALL.to_vec());
        }
        self.tasks.iter().map(|slug| slug.parse()).collect()
    }

    /// 解析槽位文件路径，相对路径以清单所在目录为基准
    pub fn slot_paths(&self) -> Result<Vec<(DocumentSlot, PathBuf)>, ConfigError> {
        let base = self
            .file_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.slots
            .iter()
            .map(|(key, path)| {
                let slot: DocumentSlot = key.parse()?;
                let resolved = if path.is_absolute() {
                    path.clone()
                } else {
                    base.join(path)
                };
                Ok((slot, resolved))
            })
            .collect()
    }
}

/// 从 TOML 文件加载审核清单
pub async fn load_manifest(manifest_path: &Path) -> Result<AuditManifest> {
    let content = fs::read_to_string(manifest_path)
        .await
        .with_context(|| format!("无法读取清单文件: {}", manifest_path.display()))?;

    let mut manifest: AuditManifest = toml::from_str(&content)
        .with_context(|| format!("无法解析清单文件: {}", manifest_path.display()))?;

    manifest.file_path = Some(manifest_path.to_path_buf());

    tracing::info!(
        "清单已加载: 格式 {}, {} 个文档, {} 个报告请求",
        manifest.format,
        manifest.slots.len(),
        manifest.reports.len()
    );

    Ok(manifest)
}
