//! 结果页扫描器 - 编排层
//!
//! ## 职责
//!
//! 对一页搜索结果逐个计算"跳过 / 保留"决定，跳过原因有固定的优先级：
//!
//! 1. 公司在黑名单中
//! 2. 发布人在黑名单中
//! 3. 标题包含屏蔽词
//! 4. 本次运行已处理过
//! 5. 冷却期内已申请
//!
//! 只记录第一个命中的原因。每个被评估过的 URL 都会加入本次运行的已处理集合。

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::events::RunEvent;
use crate::models::{JobSummary, Profile, SkipReason};
use crate::services::Ledger;
use crate::workflow::RunContext;

/// 一页的扫描结果
#[derive(Debug, Default)]
pub struct PageScan {
    pub candidates: Vec<JobSummary>,
    pub skipped: Vec<(JobSummary, SkipReason)>,
}

/// 计算单个职位的跳过原因
pub fn skip_reason(
    job: &JobSummary,
    profile: &Profile,
    session_seen: &HashSet<String>,
    ledger: &Ledger,
    now: DateTime<Utc>,
) -> Option<SkipReason> {
    let blacklist = &profile.blacklist;
    let same = |a: &str, b: &str| a.trim().eq_ignore_ascii_case(b.trim());

    if let Some(company) = blacklist.companies.iter().find(|c| same(c, &job.company)) {
        return Some(SkipReason::BlacklistedCompany(company.clone()));
    }
    if let Some(poster) = job.poster.as_deref().and_then(|poster| {
        blacklist.posters.iter().find(|p| same(p, poster))
    }) {
        return Some(SkipReason::BlacklistedPoster(poster.clone()));
    }
    let title = job.title.to_lowercase();
    if let Some(keyword) = blacklist
        .title_keywords
        .iter()
        .find(|k| !k.trim().is_empty() && title.contains(&k.trim().to_lowercase()))
    {
        return Some(SkipReason::BlacklistedTitle(keyword.clone()));
    }
    if session_seen.contains(&job.url) {
        return Some(SkipReason::AlreadySeen);
    }
    if ledger.has_at(&job.url, profile.cooldown_days, now) {
        return Some(SkipReason::RecentlyApplied);
    }
    None
}

/// 扫描一页结果
///
/// # 参数
/// - `listings`: 驱动给出的职位列表
/// - `target`: 当前搜索目标（用于统计）
/// - `ctx`: 运行上下文，已处理集合会被更新
pub fn scan_page(listings: Vec<JobSummary>, target: &str, ctx: &mut RunContext) -> PageScan {
    let now = Utc::now();
    let mut scan = PageScan::default();

    for job in listings {
        let reason = skip_reason(&job, &ctx.profile, &ctx.session_seen, &ctx.ledger, now);
        ctx.session_seen.insert(job.url.clone());

        match reason {
            Some(reason) => {
                debug!("⏭️ {} - {}", job, reason);
                ctx.stats.record_skipped(target);
                ctx.events.emit(RunEvent::JobSkipped {
                    job: job.clone(),
                    reason: reason.clone(),
                    timestamp: now,
                });
                scan.skipped.push((job, reason));
            }
            None => scan.candidates.push(job),
        }
    }

    scan
}
