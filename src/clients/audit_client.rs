/// 分析服务客户端
///
/// 所有调用都是 multipart 文件上传，一次请求一次结果，不做重试
use crate::config::Config;
use crate::error::{ConfigError, TaskError};
use crate::models::verdict::response_message;
use crate::models::{FileFormat, TaskId, UploadedDocument, REPORT_ENDPOINT};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 远程任务调用能力
///
/// 编排层只依赖这个 trait，测试时可以替换成脚本化的实现
#[async_trait]
pub trait RemoteTaskClient: Send + Sync {
    /// 上传单个文档，字段名为 `file`
    async fn run_single(
        &self,
        task: TaskId,
        format: FileFormat,
        document: &UploadedDocument,
    ) -> Result<Value, TaskError>;

    /// 在一个请求中上传多个命名文档（`file_1`、`file_2`、`file_3`）
    async fn run_group(
        &self,
        task: TaskId,
        format: FileFormat,
        documents: &[(&'static str, UploadedDocument)],
    ) -> Result<Value, TaskError>;

    /// 生成报告，返回 HTML 文本
    async fn generate_report(&self, document: &UploadedDocument) -> Result<String, TaskError>;
}

/// 基于 reqwest 的实现
pub struct HttpAuditClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuditClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 检查服务是否可用，任何错误都视为不可用
    pub async fn health_check(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("健康检查失败: {}", e);
                false
            }
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 构建文件字段
    fn file_part(endpoint: &str, document: &UploadedDocument) -> Result<Part, TaskError> {
        Part::bytes(document.content.as_ref().clone())
            .file_name(document.name.clone())
            .mime_str(document.format.mime_type())
            .map_err(|e| TaskError::network(endpoint, e.to_string()))
    }

    /// 发送表单，非 2xx 响应转为网络错误
    async fn post_form(&self, endpoint: &str, form: Form) -> Result<reqwest::Response, TaskError> {
        let url = self.url(endpoint);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TaskError::network(endpoint, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // 服务端错误优先使用其 message 字段
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(response_message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        Err(TaskError::network(endpoint, message))
    }

    async fn post_for_json(&self, endpoint: &str, form: Form) -> Result<Value, TaskError> {
        let response = self.post_form(endpoint, form).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| TaskError::network(endpoint, format!("响应不是有效的 JSON: {}", e)))
    }
}

#[async_trait]
impl RemoteTaskClient for HttpAuditClient {
    async fn run_single(
        &self,
        task: TaskId,
        format: FileFormat,
        document: &UploadedDocument,
    ) -> Result<Value, TaskError> {
        let endpoint = task.endpoint(format);
        let form = Form::new().part("file", Self::file_part(endpoint, document)?);
        self.post_for_json(endpoint, form).await
    }

    async fn run_group(
        &self,
        task: TaskId,
        format: FileFormat,
        documents: &[(&'static str, UploadedDocument)],
    ) -> Result<Value, TaskError> {
        let endpoint = task.endpoint(format);
        let mut form = Form::new();
        for (field, document) in documents {
            form = form.part(*field, Self::file_part(endpoint, document)?);
        }
        self.post_for_json(endpoint, form).await
    }

    async fn generate_report(&self, document: &UploadedDocument) -> Result<String, TaskError> {
        let form = Form::new().part("file", Self::file_part(REPORT_ENDPOINT, document)?);
        let response = self.post_form(REPORT_ENDPOINT, form).await?;
        response
            .text()
            .await
            .map_err(|e| TaskError::network(REPORT_ENDPOINT, e.to_string()))
    }
}
