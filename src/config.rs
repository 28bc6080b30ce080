/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 分析服务基础地址
    pub api_base_url: String,
    /// 请求超时（秒），未设置时使用传输层默认值
    pub request_timeout_secs: Option<u64>,
    /// 同时运行的任务数量
    pub max_concurrent_tasks: usize,
    /// 审核清单路径
    pub manifest_path: String,
    /// 报告输出目录
    pub report_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://quality-audit-api-production.up.railway.app/api/documents"
                .to_string(),
            request_timeout_secs: None,
            max_concurrent_tasks: 4,
            manifest_path: "audit.toml".to_string(),
            report_dir: "reports".to_string(),
            verbose_logging: false,
            output_log_file: "audit_output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("AUDIT_API_URL").unwrap_or(default.api_base_url),
            request_timeout_secs: std::env::var("AUDIT_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).or(default.request_timeout_secs),
            max_concurrent_tasks: std::env::var("MAX_CONCURRENT_TASKS").ok().and_then(|v| v.parse().ok()).filter(|n: &usize| *n > 0).unwrap_or(default.max_concurrent_tasks),
            manifest_path: std::env::var("AUDIT_MANIFEST").unwrap_or(default.manifest_path),
            report_dir: std::env::var("REPORT_DIR").unwrap_or(default.report_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }
}
