//! 任务目录
//!
//! 每个任务在编译期就确定了分组策略和 (任务, 格式) → 端点 的映射。
//! 端点表用穷尽的 `match` 表达，新增任务而忘记配置端点会直接编译失败。

use std::fmt;
use std::str::FromStr;

use phf::phf_map;

use crate::error::TaskError;
use crate::models::FileFormat;

/// 任务标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskId {
    Grammar,
    TitleValidation,
    TitleComparison,
    SectionValidation,
    FormatComparison,
    GoogleValidation,
    VisualValidation,
    VisualComparison,
    AiMathValidation,
    ReferenceValidation,
    CodeValidation,
    AccessibilityValidation,
    FigurePlacement,
    TablePlacement,
    WordCountValidation,
}

/// 分组策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingStrategy {
    /// 每个有文档的槽位独立请求
    Independent,
    /// 每个 CE 文档分别与 RW 对比
    PairwiseAgainstReference,
    /// 三个 CE 的一致性 + RW 参考检查
    GroupConsistency,
}

static TASK_SLUGS: phf::Map<&'static str, TaskId> = phf_map! {
    "grammar" => TaskId::Grammar,
    "title-validation" => TaskId::TitleValidation,
    "title-comparison" => TaskId::TitleComparison,
    "section-validation" => TaskId::SectionValidation,
    "format-comparison" => TaskId::FormatComparison,
    "google-validation" => TaskId::GoogleValidation,
    "visual-validation" => TaskId::VisualValidation,
    "visual-comparison" => TaskId::VisualComparison,
    "ai-math-validation" => TaskId::AiMathValidation,
    "reference-validation" => TaskId::ReferenceValidation,
    "code-validation" => TaskId::CodeValidation,
    "accessibility-validation" => TaskId::AccessibilityValidation,
    "figure-placement" => TaskId::FigurePlacement,
    "table-placement" => TaskId::TablePlacement,
    "word-count-validation" => TaskId::WordCountValidation,
};

/// 报告生成端点，与格式无关
pub const REPORT_ENDPOINT: &str = "/report/generate/";

impl TaskId {
    /// 完整任务目录，按展示顺序
    pub const ALL: [TaskId; 15] = [
        TaskId::Grammar,
        TaskId::TitleValidation,
        TaskId::TitleComparison,
        TaskId::SectionValidation,
        TaskId::FormatComparison,
        TaskId::GoogleValidation,
        TaskId::VisualValidation,
        TaskId::VisualComparison,
        TaskId::AiMathValidation,
        TaskId::ReferenceValidation,
        TaskId::CodeValidation,
        TaskId::AccessibilityValidation,
        TaskId::FigurePlacement,
        TaskId::TablePlacement,
        TaskId::WordCountValidation,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            TaskId::Grammar => "grammar",
            TaskId::TitleValidation => "title-validation",
            TaskId::TitleComparison => "title-comparison",
            TaskId::SectionValidation => "section-validation",
            TaskId::FormatComparison => "format-comparison",
            TaskId::GoogleValidation => "google-validation",
            TaskId::VisualValidation => "visual-validation",
            TaskId::VisualComparison => "visual-comparison",
            TaskId::AiMathValidation => "ai-math-validation",
            TaskId::ReferenceValidation => "reference-validation",
            TaskId::CodeValidation => "code-validation",
            TaskId::AccessibilityValidation => "accessibility-validation",
            TaskId::FigurePlacement => "figure-placement",
            TaskId::TablePlacement => "table-placement",
            TaskId::WordCountValidation => "word-count-validation",
        }
    }

    /// 日志里展示的名称
    pub fn display_name(self) -> &'static str {
        match self {
            TaskId::Grammar => "Grammar Check",
            TaskId::TitleValidation => "Title Validation",
            TaskId::TitleComparison => "Title Comparison",
            TaskId::SectionValidation => "Section Validation",
            TaskId::FormatComparison => "Format Comparison",
            TaskId::GoogleValidation => "Google Validation",
            TaskId::VisualValidation => "Visual Validation",
            TaskId::VisualComparison => "Visual Comparison",
            TaskId::AiMathValidation => "AI Math Validation",
            TaskId::ReferenceValidation => "Reference Validation",
            TaskId::CodeValidation => "Code Validation",
            TaskId::AccessibilityValidation => "Accessibility Validation",
            TaskId::FigurePlacement => "Figure Placement",
            TaskId::TablePlacement => "Table Placement",
            TaskId::WordCountValidation => "Word Count Validation",
        }
    }

    pub fn strategy(self) -> GroupingStrategy {
        match self {
            TaskId::TitleComparison | TaskId::VisualComparison => {
                GroupingStrategy::PairwiseAgainstReference
            }
            TaskId::FormatComparison => GroupingStrategy::GroupConsistency,
            TaskId::Grammar
            | TaskId::TitleValidation
            | TaskId::SectionValidation
            | TaskId::GoogleValidation
            | TaskId::VisualValidation
            | TaskId::AiMathValidation
            | TaskId::ReferenceValidation
            | TaskId::CodeValidation
            | TaskId::AccessibilityValidation
            | TaskId::FigurePlacement
            | TaskId::TablePlacement
            | TaskId::WordCountValidation => GroupingStrategy::Independent,
        }
    }

    /// 解析 (任务, 格式) 对应的端点路径（相对于 API 基础地址）
    pub fn endpoint(self, format: FileFormat) -> &'static str {
        match (self, format) {
            (TaskId::Grammar, FileFormat::Pdf) => "/pdf/grammar-check/",
            (TaskId::Grammar, FileFormat::Docx) => "/docx/grammar-check/",
            (TaskId::TitleValidation, _) => "/title/validate/",
            (TaskId::TitleComparison, _) => "/title/compare/",
            (TaskId::SectionValidation, _) => "/section/validate/",
            (TaskId::FormatComparison, _) => "/format/compare/",
            (TaskId::GoogleValidation, _) => "/validate-google-search/",
            (TaskId::VisualValidation, _) => "/visuals/validate/",
            (TaskId::VisualComparison, _) => "/visual/compare/",
            (TaskId::AiMathValidation, _) => "/validate-math-gemini/",
            (TaskId::ReferenceValidation, _) => "/reference/validate/",
            (TaskId::CodeValidation, _) => "/validate-code/",
            (TaskId::AccessibilityValidation, _) => "/accessibility/validate/",
            (TaskId::FigurePlacement, _) => "/figure-placement/validate/",
            (TaskId::TablePlacement, _) => "/table-placement/validate/",
            (TaskId::WordCountValidation, _) => "/word-count/validate/",
        }
    }
}

impl FromStr for TaskId {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TASK_SLUGS
            .get(s)
            .copied()
            .ok_or_else(|| TaskError::UnknownTask {
                task: s.to_string(),
            })
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}
