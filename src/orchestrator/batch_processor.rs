//! 批量任务处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，按审核清单批量运行任务。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件、创建 HTTP 客户端、检查服务可用性
//! 2. **加载清单**：读取格式、文档、任务列表和报告请求
//! 3. **上传文档**：按当前格式校验扩展名后放入槽位
//! 4. **并发控制**：最多同时运行 `max_concurrent_tasks` 个任务
//! 5. **结果汇总**：输出结果表和通过/未通过统计，再生成报告

use crate::clients::HttpAuditClient;
use crate::config::Config;
use crate::models::{
    load_manifest, AuditManifest, RunStats, TaskId, TaskStatus, UploadedDocument,
};
use crate::orchestrator::task_orchestrator::TaskOrchestrator;
use crate::services::{ReportWriter, SlotResults};
use crate::utils::logging;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    client: Arc<HttpAuditClient>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(&config);

        let client = HttpAuditClient::new(&config).context("无法创建分析服务客户端")?;

        if client.health_check().await {
            info!("✓ 分析服务可用: {}", config.api_base_url);
        } else {
            warn!("⚠️ 分析服务健康检查未通过，继续运行: {}", config.api_base_url);
        }

        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let manifest = load_manifest(Path::new(&self.config.manifest_path)).await?;
        let tasks = manifest.task_ids()?;

        let orchestrator = TaskOrchestrator::new(
            self.client.clone(),
            Arc::new(ReportWriter::new(&self.config.report_dir)),
            manifest.format,
        );

        let uploaded = self.upload_documents(&orchestrator, &manifest).await?;
        if uploaded == 0 {
            warn!("⚠️ 清单中没有可用的文档，程序结束");
            return Ok(());
        }

        logging::log_tasks_loaded(tasks.len(), self.config.max_concurrent_tasks);

        // 运行所有任务
        let stats = self.run_all_tasks(&orchestrator, &tasks).await;

        let results = orchestrator.get_all_results();
        logging::log_results_table(&tasks, &results);
        logging::append_results(&self.config.output_log_file, &results)?;

        // 生成报告
        for request in &manifest.reports {
            if let Err(e) = orchestrator
                .generate_report(request.slot, request.action)
                .await
            {
                error!("❌ {} 报告生成失败: {}", request.slot, e);
            }
        }

        logging::print_final_stats(&stats, &self.config.output_log_file);

        Ok(())
    }

    /// 读取清单中的文档并放入槽位，返回成功上传的数量
    async fn upload_documents(
        &self,
        orchestrator: &TaskOrchestrator,
        manifest: &AuditManifest,
    ) -> Result<usize> {
        let mut uploaded = 0;
        for (slot, path) in manifest.slot_paths()? {
            match UploadedDocument::from_path(&path, manifest.format).await {
                Ok(document) => {
                    orchestrator.set_slot(slot, Some(document));
                    uploaded += 1;
                }
                Err(e) => warn!("⚠️ {} 上传被拒绝: {}", slot, e),
            }
        }
        Ok(uploaded)
    }

    /// 以有限并发运行全部任务
    async fn run_all_tasks(&self, orchestrator: &TaskOrchestrator, tasks: &[TaskId]) -> RunStats {
        let outcomes: Vec<_> = stream::iter(tasks.iter().copied())
            .map(|task| async move { (task, orchestrator.run_task(task).await) })
            .buffer_unordered(self.config.max_concurrent_tasks)
            .collect()
            .await;

        let mut stats = RunStats {
            tasks: tasks.len(),
            ..Default::default()
        };

        for (task, outcome) in outcomes {
            match outcome {
                Ok(_) => {
                    let slots = orchestrator.get_results(task);
                    stats.pass += count_status(&slots, TaskStatus::Pass);
                    stats.fail += count_status(&slots, TaskStatus::Fail);
                }
                Err(e) => {
                    warn!("⚠️ [{}] 未运行: {}", task, e);
                    stats.skipped += 1;
                }
            }
        }

        stats
    }
}

fn count_status(slots: &SlotResults, status: TaskStatus) -> usize {
    slots.values().filter(|r| r.status == status).count()
}
