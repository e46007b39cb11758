//! 搜索 / 配额调度器 - 编排层
//!
//! ## 职责
//!
//! 遍历搜索目标（打乱顺序）× 地点（打乱顺序），逐页翻阅结果，
//! 把候选职位交给 `JobApplicator`，并维护配额、Ledger、报告。
//!
//! ## 状态
//!
//! `翻页 → 申请 → (本页结束 | 地点结束 | 配额用完 | 运行终止)`
//!
//! ## 失败语义
//!
//! - 没有更多结果：正常进入下一个地点
//! - 找不到结果列表：只放弃当前页，进入下一个地点
//! - 当日申请上限：终止整个运行
//! - 取消信号：在每个职位和每一页之间检查

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::events::RunEvent;
use crate::infrastructure::{BoardDriver, JobListView};
use crate::models::SearchTarget;
use crate::orchestrator::page_scanner::scan_page;
use crate::services::{Pacer, ReportWriter};
use crate::workflow::{Flow, JobApplicator, JobCtx, RunContext};

/// 运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    DailyLimitReached,
}

impl RunOutcome {
    /// 进程退出码
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::DailyLimitReached => 2,
            RunOutcome::Cancelled => 130,
        }
    }
}

/// 一个地点的结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationEnd {
    Exhausted,
    QuotaReached,
    Cancelled,
    DailyLimit,
}

/// 调度器
///
/// 职责：
/// - 唯一决定"下一个处理哪个职位"的地方
/// - 成功提交后立即写 Ledger、计配额
/// - 不关心向导内部细节
pub struct Scheduler {
    driver: Arc<dyn BoardDriver>,
    applicator: JobApplicator,
    reports: ReportWriter,
    pacer: Pacer,
    shuffle: bool,
}

impl Scheduler {
    pub fn new(
        driver: Arc<dyn BoardDriver>,
        applicator: JobApplicator,
        reports: ReportWriter,
        pacer: Pacer,
    ) -> Self {
        Self {
            driver,
            applicator,
            reports,
            pacer,
            shuffle: true,
        }
    }

    /// 按配置顺序遍历目标和地点（测试用）
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// 执行一次完整运行
    pub async fn run(&self, ctx: &mut RunContext) -> Result<RunOutcome> {
        let outcome = self.run_targets(ctx).await?;

        if outcome == RunOutcome::DailyLimitReached {
            ctx.events.emit(RunEvent::RunAborted {
                reason: "已达当日申请上限".to_string(),
                timestamp: chrono::Utc::now(),
            });
        }
        ctx.events.emit(RunEvent::RunFinished {
            outcome,
            applied: ctx.stats.total_applied(),
            timestamp: chrono::Utc::now(),
        });

        Ok(outcome)
    }

    async fn run_targets(&self, ctx: &mut RunContext) -> Result<RunOutcome> {
        let mut targets: Vec<SearchTarget> = ctx.profile.targets.clone();
        if self.shuffle {
            targets.shuffle(&mut rand::thread_rng());
        }

        let mut pages_done = 0usize;

        for target in &targets {
            let mut locations: Vec<String> = ctx.profile.locations_for(target).to_vec();
            if self.shuffle {
                locations.shuffle(&mut rand::thread_rng());
            }

            log_target_start(target);

            for location in &locations {
                if ctx.is_cancelled() {
                    return Ok(RunOutcome::Cancelled);
                }
                if ctx.quotas.is_exhausted(&target.name) {
                    info!("🎯 [{}] 配额已用完，跳过剩余地点", target.name);
                    break;
                }

                match self
                    .run_location(ctx, target, location, &mut pages_done)
                    .await?
                {
                    LocationEnd::Exhausted => continue,
                    LocationEnd::QuotaReached => break,
                    LocationEnd::Cancelled => return Ok(RunOutcome::Cancelled),
                    LocationEnd::DailyLimit => return Ok(RunOutcome::DailyLimitReached),
                }
            }
        }

        Ok(RunOutcome::Completed)
    }

    async fn run_location(
        &self,
        ctx: &mut RunContext,
        target: &SearchTarget,
        location: &str,
        pages_done: &mut usize,
    ) -> Result<LocationEnd> {
        let first_page = ctx.profile.start_page;
        let max_pages = ctx.profile.max_pages;
        let mut page = first_page;

        loop {
            if max_pages.is_some_and(|max| page - first_page >= max) {
                debug!("[{}/{}] 已达每个地点的最大页数", target.name, location);
                return Ok(LocationEnd::Exhausted);
            }
            if ctx.is_cancelled() {
                return Ok(LocationEnd::Cancelled);
            }

            let started = Instant::now();
            info!("🔍 [{}/{}] 第 {} 页", target.name, location, page + 1);

            if let Err(e) = self.driver.open_search(&target.name, location, page).await {
                warn!("⚠️ [{}/{}] 打开搜索页失败: {:#}", target.name, location, e);
                return Ok(LocationEnd::Exhausted);
            }

            let listings = match self.driver.find_job_list().await {
                Ok(JobListView::Listings(listings)) if !listings.is_empty() => listings,
                Ok(JobListView::Listings(_)) | Ok(JobListView::NoResults) => {
                    info!("[{}/{}] 没有更多结果", target.name, location);
                    return Ok(LocationEnd::Exhausted);
                }
                Ok(JobListView::Missing) => {
                    warn!("⚠️ [{}/{}] 找不到结果列表，换下一个地点", target.name, location);
                    return Ok(LocationEnd::Exhausted);
                }
                Err(e) => {
                    warn!("⚠️ [{}/{}] 读取结果列表失败: {:#}", target.name, location, e);
                    return Ok(LocationEnd::Exhausted);
                }
            };

            let scan = scan_page(listings, &target.name, ctx);
            info!(
                "[{}/{}] 本页候选 {} 个，跳过 {} 个",
                target.name,
                location,
                scan.candidates.len(),
                scan.skipped.len()
            );
            ctx.events.emit(RunEvent::PageScanned {
                target: target.name.clone(),
                location: location.to_string(),
                page,
                candidates: scan.candidates.len(),
                skipped: scan.skipped.len(),
                timestamp: chrono::Utc::now(),
            });

            for (i, job) in scan.candidates.iter().enumerate() {
                if ctx.is_cancelled() {
                    return Ok(LocationEnd::Cancelled);
                }
                if ctx.quotas.is_exhausted(&target.name) {
                    return Ok(LocationEnd::QuotaReached);
                }

                let job_ctx = JobCtx::new(&target.name, location, page, i + 1);
                let flow = self
                    .applicator
                    .apply(self.driver.as_ref(), job, &job_ctx, &ctx.cancel)
                    .await;

                match flow {
                    Flow::Ok => {
                        ctx.ledger
                            .add(&job.url)
                            .with_context(|| format!("写入 Ledger 失败: {}", job.url))?;
                        let count = ctx.quotas.record(&target.name);
                        ctx.stats.record_applied(&target.name);
                        if let Err(e) = self.reports.record_applied(&target.name, job) {
                            warn!("写入申请记录失败: {}", e);
                        }
                        ctx.events.emit(RunEvent::JobApplied {
                            target: target.name.clone(),
                            job: job.clone(),
                            timestamp: chrono::Utc::now(),
                        });

                        if let Some(limit) = ctx.quotas.limit(&target.name) {
                            info!("🎯 [{}] 配额 {}/{}", target.name, count, limit);
                            if count >= limit {
                                ctx.events.emit(RunEvent::QuotaReached {
                                    target: target.name.clone(),
                                    limit,
                                    timestamp: chrono::Utc::now(),
                                });
                                return Ok(LocationEnd::QuotaReached);
                            }
                        }
                    }
                    Flow::Skip(reason) => {
                        ctx.stats.record_skipped(&target.name);
                        ctx.events.emit(RunEvent::JobSkipped {
                            job: job.clone(),
                            reason,
                            timestamp: chrono::Utc::now(),
                        });
                    }
                    Flow::Fatal(kind) => {
                        ctx.stats.record_failed(&target.name);
                        let reason = kind.to_string();
                        if let Err(e) = self.reports.record_failed(&target.name, job, &reason) {
                            warn!("写入失败记录失败: {}", e);
                        }
                        ctx.events.emit(RunEvent::JobFailed {
                            target: target.name.clone(),
                            job: job.clone(),
                            reason,
                            timestamp: chrono::Utc::now(),
                        });
                        if kind.aborts_run() {
                            error!("🛑 已达当日申请上限，终止运行");
                            return Ok(LocationEnd::DailyLimit);
                        }
                    }
                }
            }

            *pages_done += 1;
            self.pacer.page_done(started, *pages_done, &ctx.cancel).await;
            page += 1;
        }
    }
}

fn log_target_start(target: &SearchTarget) {
    info!("\n{}", "=".repeat(60));
    match target.quota_limit {
        Some(limit) => info!("🎯 搜索目标: {} (配额 {})", target.name, limit),
        None => info!("🎯 搜索目标: {}", target.name),
    }
    info!("{}", "=".repeat(60));
}
