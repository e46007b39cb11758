//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、档案、台账、浏览器、协作方
//! 2. **资源管理**：持有 Browser，确保生命周期覆盖整个运行
//! 3. **委托执行**：把运行交给 `Scheduler`
//! 4. **全局统计**：运行结束后输出汇总

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::AppError;
use crate::events::EventSink;
use crate::infrastructure::{DomDriver, DomSelectors, JsExecutor};
use crate::models::load_profile;
use crate::orchestrator::scheduler::{RunOutcome, Scheduler};
use crate::services::{
    AnswerPipeline, Collaborator, HttpCollaborator, Ledger, LlmService, Pacer, ReportWriter,
    UnpreparedWriter,
};
use crate::utils::logging::{init_log_file, log_startup, print_final_stats};
use crate::workflow::{JobApplicator, RunContext};

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    scheduler: Scheduler,
    ctx: RunContext,
}

impl App {
    /// 初始化应用
    ///
    /// 任何一步失败都是启动错误，直接返回
    pub async fn initialize(config: Config, cancel: CancellationToken, events: EventSink) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        if reqwest::Url::parse(&config.search_url).is_err() {
            return Err(AppError::invalid_config("SEARCH_URL", &config.search_url, "完整的 http(s) 地址").into());
        }

        let profile = Arc::new(load_profile(Path::new(&config.profile_path)).await?);
        log_startup(&config, &profile);

        let ledger = Ledger::load(&config.ledger_path)?;
        info!("✓ 台账已加载: {} 条记录", ledger.len());

        let (browser, page) = if config.headless {
            browser::launch_headless_browser(&config.board_url, config.chrome_path.as_deref())
                .await
                .map_err(AppError::browser_launch_failed)?
        } else {
            let host = config.board_host();
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                Some(&config.board_url),
                host.as_deref(),
            )
            .await
            .map_err(|e| AppError::browser_connection_failed(config.browser_debug_port, e))?
        };

        let selectors = DomSelectors::load(config.selectors_file.as_deref().map(Path::new)).await?;
        let driver = DomDriver::new(JsExecutor::new(page), selectors, config.search_url.clone());

        let timeout = Duration::from_secs(config.collaborator_timeout_secs);
        let collaborator = build_collaborator(&config, timeout)?;

        let pipeline = AnswerPipeline::new(
            profile.clone(),
            collaborator,
            UnpreparedWriter::with_path(&config.unprepared_log),
        )
        .with_timeout(timeout);
        let pacer = Pacer::for_mode(profile.pacing);
        let applicator =
            JobApplicator::new(pipeline, pacer.clone()).with_max_steps(config.max_wizard_steps);
        let reports = ReportWriter::new(&config.applied_csv, &config.failed_csv);
        let scheduler = Scheduler::new(Arc::new(driver), applicator, reports, pacer);

        let ctx = RunContext::new(profile, ledger, cancel, events);

        Ok(Self {
            config,
            browser,
            scheduler,
            ctx,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<RunOutcome> {
        let outcome = self.scheduler.run(&mut self.ctx).await;

        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器会话失败: {}", e);
        }

        let outcome = outcome?;
        print_final_stats(&self.ctx.stats, outcome, &self.config);
        Ok(outcome)
    }
}

/// 选择协作方：配置了 HTTP 地址优先，其次 LLM，都没有则只用确定性规则
fn build_collaborator(config: &Config, timeout: Duration) -> Result<Option<Arc<dyn Collaborator>>> {
    if let Some(url) = &config.collaborator_url {
        let http = HttpCollaborator::new(url.clone(), timeout)
            .with_context(|| format!("无法创建 HTTP 协作方: {}", url))?;
        info!("🤖 使用 HTTP 协作方: {}", url);
        return Ok(Some(Arc::new(http)));
    }
    if !config.llm_api_key.is_empty() {
        info!("🤖 使用 LLM 协作方: {}", config.llm_model_name);
        return Ok(Some(Arc::new(LlmService::new(config))));
    }
    warn!("⚠️ 未配置协作方，无法确定的问题将使用默认值");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_selection() {
        let mut config = Config::default();
        assert!(build_collaborator(&config, Duration::from_secs(1)).unwrap().is_none());

        config.llm_api_key = "sk-test".to_string();
        assert!(build_collaborator(&config, Duration::from_secs(1)).unwrap().is_some());

        config.collaborator_url = Some("http://127.0.0.1:8080".to_string());
        assert!(build_collaborator(&config, Duration::from_secs(1)).unwrap().is_some());
    }
}
