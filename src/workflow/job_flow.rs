//! 职位申请流程 - 流程层
//!
//! 核心职责：把"一个职位"从打开推进到提交 / 跳过 / 失败
//!
//! 流程顺序：
//! 1. 打开职位 →（可选）适配度评估
//! 2. 打开站内申请向导
//! 3. 逐步填写 → 前进 → 检查页面信号，直到提交
//! 4. 任何失败都放弃向导，让下一个职位从干净状态开始

use anyhow::Result;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::infrastructure::{is_submit_label, BoardDriver, PageSignal};
use crate::models::{ControlKind, FieldValue, JobSummary, SkipReason, WizardField};
use crate::services::{AnswerPipeline, Pacer};
use crate::utils::truncate_text;
use crate::workflow::history_step::{fill_group, GroupEntry};
use crate::workflow::job_ctx::JobCtx;

/// 向导最多前进的步数，超过视为页面结构异常
pub const MAX_STEPS: usize = 12;

/// 致命错误的种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalKind {
    /// 表单校验失败，只影响当前职位，不重试
    ValidationRequired(String),
    /// 当日申请次数用完，终止整个运行
    DailyLimitReached,
    /// 找不到预期的页面元素，只影响当前职位
    UiDiscovery(String),
}

impl FatalKind {
    pub fn aborts_run(&self) -> bool {
        matches!(self, FatalKind::DailyLimitReached)
    }
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalKind::ValidationRequired(msg) => write!(f, "表单校验失败: {}", msg),
            FatalKind::DailyLimitReached => write!(f, "已达当日申请上限"),
            FatalKind::UiDiscovery(msg) => write!(f, "页面元素异常: {}", msg),
        }
    }
}

/// 单个职位的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// 已提交
    Ok,
    Skip(SkipReason),
    Fatal(FatalKind),
}

/// 向导步骤的种类（按标题判断）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Contact,
    Address,
    Resume,
    WorkHistory,
    Education,
    Questions,
}

impl StepKind {
    pub fn from_heading(heading: Option<&str>) -> Self {
        let Some(heading) = heading else {
            return StepKind::Questions;
        };
        let h = heading.to_lowercase();
        if h.contains("contact") {
            StepKind::Contact
        } else if h.contains("address") {
            StepKind::Address
        } else if h.contains("resume") || h.contains("cv") || h.contains("document") {
            StepKind::Resume
        } else if h.contains("work experience") || h.contains("employment") || h.contains("work history") {
            StepKind::WorkHistory
        } else if h.contains("education") {
            StepKind::Education
        } else {
            StepKind::Questions
        }
    }

    /// 这些步骤中页面预填的内容保持不动
    fn keeps_prefilled(self) -> bool {
        matches!(self, StepKind::Contact | StepKind::Address | StepKind::Resume)
    }
}

/// 职位申请流程
///
/// - 编排一个职位的完整申请流程
/// - 决定何时评估、何时填写、何时提交
/// - 不持有页面资源，只通过 `BoardDriver` 操作
/// - 不处理配额和 Ledger（属于编排层）
pub struct JobApplicator {
    pipeline: AnswerPipeline,
    pacer: Pacer,
    max_steps: usize,
}

impl JobApplicator {
    pub fn new(pipeline: AnswerPipeline, pacer: Pacer) -> Self {
        Self {
            pipeline,
            pacer,
            max_steps: MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// 处理一个职位
    ///
    /// 页面操作出错统一视为 `UiDiscovery`，不会向上抛错
    pub async fn apply(
        &self,
        driver: &dyn BoardDriver,
        job: &JobSummary,
        ctx: &JobCtx,
        cancel: &CancellationToken,
    ) -> Flow {
        info!("{} 📄 打开职位: {}", ctx, job);

        let mut wizard_opened = false;
        let flow = match self.run(driver, job, ctx, cancel, &mut wizard_opened).await {
            Ok(flow) => flow,
            Err(e) => Flow::Fatal(FatalKind::UiDiscovery(format!("{:#}", e))),
        };

        match &flow {
            Flow::Ok => info!("{} ✅ 申请已提交: {}", ctx, job),
            Flow::Skip(reason) => info!("{} ⏭️ 跳过: {}", ctx, reason),
            Flow::Fatal(kind) => {
                error!("{} ❌ 申请失败 ({}): {}", ctx, job.url, kind);
                if wizard_opened {
                    if let Err(e) = driver.discard_wizard().await {
                        warn!("{} ⚠️ 放弃向导失败: {}", ctx, e);
                    }
                }
            }
        }

        flow
    }

    async fn run(
        &self,
        driver: &dyn BoardDriver,
        job: &JobSummary,
        ctx: &JobCtx,
        cancel: &CancellationToken,
        wizard_opened: &mut bool,
    ) -> Result<Flow> {
        driver.open_job(job).await?;
        self.pacer.after_open(cancel).await;

        let profile = self.pipeline.profile();
        if profile.fit_check {
            let description = driver.job_description().await?;
            debug!("{} 职位描述: {}", ctx, truncate_text(&description, 80));
            if let Some(verdict) = self.pipeline.evaluate_fit(job, &description).await {
                if !verdict.result {
                    let why = verdict.explanation.unwrap_or_default();
                    return Ok(Flow::Skip(SkipReason::PoorFit(why)));
                }
                debug!("{} 适配度评估通过", ctx);
            }
        }

        if !driver.start_wizard().await? {
            return Ok(Flow::Skip(SkipReason::NoInPageApplication));
        }
        *wizard_opened = true;

        let job_context = format!("Job: {} at {} ({})", job.title, job.company, job.location);

        for step in 0..self.max_steps {
            let heading = driver.find_step_heading().await?;
            let kind = StepKind::from_heading(heading.as_deref());
            debug!("{} 第 {} 步: {:?} ({:?})", ctx, step + 1, heading, kind);

            self.fill_step(driver, kind, &job_context, ctx).await?;

            let Some(label) = driver.advance_label().await? else {
                return Ok(Flow::Fatal(FatalKind::UiDiscovery(
                    "找不到前进按钮".to_string(),
                )));
            };
            let submitting = is_submit_label(&label);
            if submitting {
                driver.set_follow_company(profile.follow_companies).await?;
                info!("{} 📤 正在提交申请...", ctx);
            }

            self.pacer.around_advance(cancel).await;
            driver.advance().await?;
            self.pacer.around_advance(cancel).await;

            match driver.page_signal().await? {
                PageSignal::DailyLimit => return Ok(Flow::Fatal(FatalKind::DailyLimitReached)),
                PageSignal::ValidationError(msg) => {
                    return Ok(Flow::Fatal(FatalKind::ValidationRequired(msg)))
                }
                PageSignal::Clear => {}
            }

            if submitting {
                return Ok(Flow::Ok);
            }
        }

        Ok(Flow::Fatal(FatalKind::UiDiscovery(format!(
            "{} 步内未到达提交",
            self.max_steps
        ))))
    }

    async fn fill_step(
        &self,
        driver: &dyn BoardDriver,
        kind: StepKind,
        job_context: &str,
        ctx: &JobCtx,
    ) -> Result<()> {
        let profile = self.pipeline.profile();
        match kind {
            StepKind::WorkHistory => {
                let entries: Vec<GroupEntry> = profile.work_history.iter().map(GroupEntry::from).collect();
                return fill_group(driver, &entries).await;
            }
            StepKind::Education => {
                let entries: Vec<GroupEntry> = profile.education.iter().map(GroupEntry::from).collect();
                return fill_group(driver, &entries).await;
            }
            _ => {}
        }

        for field in driver.fields().await? {
            let Some(value) = self.value_for(&field, kind, job_context).await else {
                continue;
            };
            if let Err(e) = driver.fill_field(&field.id, &value).await {
                // 留给校验横幅判定
                warn!("{} ⚠️ 字段填写失败 [{}]: {}", ctx, field.question.label, e);
            }
        }

        if kind == StepKind::Contact && profile.verify_email {
            self.reselect_email(driver, job_context, ctx).await?;
        }
        Ok(())
    }

    /// 预填的联系邮箱按档案重新选择
    async fn reselect_email(
        &self,
        driver: &dyn BoardDriver,
        job_context: &str,
        ctx: &JobCtx,
    ) -> Result<()> {
        let Some(field) = driver.find_field("email").await? else {
            debug!("{} 联系信息中没有邮箱字段", ctx);
            return Ok(());
        };
        if !field.is_prefilled() {
            return Ok(());
        }
        let answer = self.pipeline.resolve(&field.question, job_context).await;
        debug!("{} 重新选择联系邮箱: {}", ctx, answer.value.display_text());
        if let Err(e) = driver.fill_field(&field.id, &answer.value).await {
            warn!("{} ⚠️ 联系邮箱选择失败: {}", ctx, e);
        }
        Ok(())
    }

    /// 决定字段要写入的值；`None` 表示保持原样
    async fn value_for(
        &self,
        field: &WizardField,
        kind: StepKind,
        job_context: &str,
    ) -> Option<FieldValue> {
        let profile = self.pipeline.profile();

        if field.question.kind == ControlKind::File {
            if field.is_prefilled() {
                return None;
            }
            return profile.resume_path.clone().map(FieldValue::File);
        }

        if kind.keeps_prefilled() && field.is_prefilled() {
            return None;
        }

        let answer = self.pipeline.resolve(&field.question, job_context).await;
        let line = format!(
            "  {} -> {} ({})",
            field.question.label,
            answer.value.display_text(),
            answer.source.as_str()
        );
        // 档案 debug 开关：每个回答都打到 info
        if profile.debug {
            info!("{}", line);
        } else {
            debug!("{}", line);
        }
        Some(answer.value)
    }
}
