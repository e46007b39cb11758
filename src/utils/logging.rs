//! 日志工具模块
//!
//! 提供日志初始化、运行横幅和统计输出的辅助函数

use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::Profile;
use crate::orchestrator::RunOutcome;
use crate::workflow::RunStats;

/// 初始化 tracing（`RUST_LOG` 优先，否则按 verbose 选择 debug / info）
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n申请运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, profile: &Profile) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动申请模式");
    info!(
        "📋 搜索目标: {}",
        profile
            .targets
            .iter()
            .map(|t| match t.quota_limit {
                Some(limit) => format!("{} (配额 {})", t.name, limit),
                None => t.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("⏱️ 节奏模式: {:?}", profile.pacing);
    info!(
        "🤖 协作方: {}",
        config
            .collaborator_url
            .as_deref()
            .unwrap_or(if config.llm_api_key.is_empty() { "未配置" } else { "LLM" })
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, outcome: RunOutcome, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行结束: {:?}", outcome);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for (target, s) in stats.iter() {
        info!(
            "🎯 {}: ✅ 申请 {} | ⏭️ 跳过 {} | ❌ 失败 {}",
            target, s.applied, s.skipped, s.failed
        );
    }
    info!("✅ 共申请: {}", stats.total_applied());
    info!("{}", "=".repeat(60));
    info!("\n申请记录: {} / 失败记录: {}", config.applied_csv, config.failed_csv);
    info!("未准备问题: {}", config.unprepared_log);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("申请向导第一步", 4), "申请向导...");
    }
}
