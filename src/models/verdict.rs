//! 响应判定解码
//!
//! 分析服务对不同任务返回的 JSON 结构不同，这里把它们解码成统一的 [`Signal`]：
//!
//! - 单文档校验：按 `status == "pass"` → `is_valid == true` → `success == true`
//!   的优先级取第一个表示通过的字段；都不通过时取第一个出现的字段；都不存在视为失败
//! - 标题对比：`match`
//! - 视觉对比：`similarity`，缺失时取 `summary.similarity_score`，达到 100 才算通过
//! - 格式对比：`consistency.all_match`

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::models::TaskId;

/// 视觉相似度满分
pub const MAX_SIMILARITY: f64 = 100.0;

/// 解码后的判定信号
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Status(String),
    IsValid(bool),
    Success(bool),
    Match(bool),
    Similarity(f64),
    AllMatch(bool),
    /// 响应中没有可识别的判定字段
    Missing,
}

impl Signal {
    pub fn passed(&self) -> bool {
        match self {
            Signal::Status(status) => status == "pass",
            Signal::IsValid(flag)
            | Signal::Success(flag)
            | Signal::Match(flag)
            | Signal::AllMatch(flag) => *flag,
            Signal::Similarity(score) => *score >= MAX_SIMILARITY,
            Signal::Missing => false,
        }
    }
}

/// 任务对应的响应结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Validation,
    TitleMatch,
    VisualSimilarity,
    FormatConsistency,
}

impl ResponseShape {
    pub fn for_task(task: TaskId) -> Self {
        match task {
            TaskId::TitleComparison => ResponseShape::TitleMatch,
            TaskId::VisualComparison => ResponseShape::VisualSimilarity,
            TaskId::FormatComparison => ResponseShape::FormatConsistency,
            _ => ResponseShape::Validation,
        }
    }

    pub fn decode(self, payload: &JsonValue) -> Signal {
        match self {
            ResponseShape::Validation => parse::<ValidationFields>(payload).signal(),
            ResponseShape::TitleMatch => parse::<TitleFields>(payload)
                .matched
                .map(Signal::Match)
                .unwrap_or(Signal::Missing),
            ResponseShape::VisualSimilarity => {
                let fields = parse::<SimilarityFields>(payload);
                fields
                    .similarity
                    .or_else(|| fields.summary.and_then(|s| s.similarity_score))
                    .map(Signal::Similarity)
                    .unwrap_or(Signal::Missing)
            }
            ResponseShape::FormatConsistency => parse::<FormatFields>(payload)
                .consistency
                .and_then(|c| c.all_match)
                .map(Signal::AllMatch)
                .unwrap_or(Signal::Missing),
        }
    }
}

/// 取响应中的 `message` 字段
pub fn response_message(payload: &JsonValue) -> Option<String> {
    parse::<MessageField>(payload).message
}

fn parse<T: DeserializeOwned + Default>(payload: &JsonValue) -> T {
    match T::deserialize(payload) {
        Ok(fields) => fields,
        Err(e) => {
            debug!("响应字段类型不符，按缺失处理: {}", e);
            T::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValidationFields {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    is_valid: Option<bool>,
    #[serde(default)]
    success: Option<bool>,
}

impl ValidationFields {
    fn signal(self) -> Signal {
        let candidates = [
            self.status.map(Signal::Status),
            self.is_valid.map(Signal::IsValid),
            self.success.map(Signal::Success),
        ];

        let mut first_present = None;
        for signal in candidates.into_iter().flatten() {
            if signal.passed() {
                return signal;
            }
            first_present.get_or_insert(signal);
        }
        first_present.unwrap_or(Signal::Missing)
    }
}

#[derive(Debug, Default, Deserialize)]
struct TitleFields {
    #[serde(default, rename = "match")]
    matched: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarityFields {
    #[serde(default)]
    similarity: Option<f64>,
    #[serde(default)]
    summary: Option<SimilaritySummary>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilaritySummary {
    #[serde(default)]
    similarity_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FormatFields {
    #[serde(default)]
    consistency: Option<Consistency>,
}

#[derive(Debug, Default, Deserialize)]
struct Consistency {
    #[serde(default)]
    all_match: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageField {
    #[serde(default)]
    message: Option<String>,
}
