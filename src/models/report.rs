use serde::Deserialize;

use crate::models::DocumentSlot;

/// 报告的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportAction {
    /// 直接打开查看
    View,
    /// 保存为可下载文件
    Download,
}

/// 生成好的报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub slot: DocumentSlot,
    pub action: ReportAction,
    pub file_name: String,
    pub html: String,
}

impl ReportArtifact {
    pub fn new(slot: DocumentSlot, action: ReportAction, html: String) -> Self {
        Self {
            slot,
            action,
            file_name: report_file_name(slot),
            html,
        }
    }
}

/// 报告文件名只由槽位决定
pub fn report_file_name(slot: DocumentSlot) -> String {
    format!("audit-report-{}.html", slot.as_str())
}
