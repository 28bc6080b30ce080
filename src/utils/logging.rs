use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{DocumentSlot, RunStats, TaskId, TaskStatus};
use crate::services::SlotResults;

/// 初始化 tracing 日志
///
/// 默认 `info` 级别，`RUST_LOG` 可覆盖；`verbose` 为真时默认 `debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n文档审核日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文档审核模式");
    info!("🌐 服务地址: {}", config.api_base_url);
    info!("📊 最大并发任务数: {}", config.max_concurrent_tasks);
    info!("{}", "=".repeat(60));
}

/// 记录任务加载信息
pub fn log_tasks_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 共 {} 个任务待运行", total);
    info!("📋 最多同时运行 {} 个任务\n", max_concurrent);
}

/// 按槽位顺序排列一行结果
pub fn result_row(slots: Option<&SlotResults>) -> Vec<&'static str> {
    DocumentSlot::ALL
        .iter()
        .map(|slot| {
            slots
                .and_then(|s| s.get(slot))
                .map(|r| r.status.badge())
                .unwrap_or(TaskStatus::Pending.badge())
        })
        .collect()
}

/// 输出结果表
///
/// # 参数
/// - `tasks`: 本次运行的任务（决定行顺序）
/// - `results`: 结果存储快照
pub fn log_results_table(tasks: &[TaskId], results: &BTreeMap<TaskId, SlotResults>) {
    info!("\n{}", "=".repeat(60));
    info!("{:<28} {:>4} {:>4} {:>4} {:>4}", "任务", "CE1", "CE2", "CE3", "RW");
    info!("{}", "─".repeat(60));
    for task in tasks {
        let row = result_row(results.get(task));
        info!(
            "{:<28} {:>4} {:>4} {:>4} {:>4}",
            task.display_name(),
            row[0],
            row[1],
            row[2],
            row[3]
        );
    }
    info!("{}", "=".repeat(60));
}

/// 把结果明细追加到日志文件
pub fn append_results(log_file_path: &str, results: &BTreeMap<TaskId, SlotResults>) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    for (task, slots) in results {
        for (slot, result) in slots {
            let message = result.message.as_deref().unwrap_or("-");
            writeln!(
                file,
                "{} | {} | {} | {}",
                task,
                slot,
                result.status.badge(),
                truncate_text(message, 120)
            )?;
        }
    }

    Ok(())
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部任务完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🗂 任务: {} (未运行 {})", stats.tasks, stats.skipped);
    info!("✅ 通过: {}", stats.pass);
    info!("❌ 未通过: {}", stats.fail);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
