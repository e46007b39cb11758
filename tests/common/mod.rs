//! 集成测试共用的脚本化站点驱动和协作方

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use jobpilot::infrastructure::{BoardDriver, JobListView, PageSignal};
use jobpilot::models::{FieldValue, JobSummary, Profile, WizardField};
use jobpilot::services::collaborator::{
    AnswerRequest, AnswerResponse, FitRequest, FitResponse,
};
use jobpilot::services::{
    AnswerPipeline, Collaborator, CollaboratorError, Pacer, ReportWriter, UnpreparedWriter,
};
use jobpilot::workflow::JobApplicator;
use jobpilot::Scheduler;

pub const PROFILE_TOML: &str = r#"
locations = ["remote", "berlin"]
cooldown_days = 30

[[targets]]
name = "sales"
quota_limit = 2

[[targets]]
name = "support"
locations = ["remote"]

[blacklist]
companies = ["Evil Corp"]
posters = ["Spam Recruiter"]
title_keywords = ["intern"]

[personal]
first_name = "Alex"
last_name = "Morgan"
email = "alex.morgan@example.com"
phone = "5550100"
city = "Austin"

[checkboxes]
legally_authorized = true
requires_visa_sponsorship = false

[experience]
default = 2
Salesforce = 4
"#;

pub fn profile() -> Profile {
    toml::from_str(PROFILE_TOML).expect("valid profile")
}

pub fn job(id: u32, company: &str, title: &str) -> JobSummary {
    JobSummary::new(
        title,
        company,
        Some("Jordan Recruiter".to_string()),
        "Remote",
        &format!("https://board.example.com/jobs/view/{}/?trk=search", id),
    )
}

/// 向导中的一步
#[derive(Debug, Clone)]
pub struct Step {
    pub heading: Option<String>,
    pub fields: Vec<WizardField>,
    pub advance_label: Option<String>,
    /// 点击前进后出现的页面信号
    pub signal: PageSignal,
    /// 可重复分组：页面上已有的条目数
    pub group_entries: usize,
    /// 可重复分组中每条记录的字段，id 会加上 `#<序号>`
    pub group_template: Vec<WizardField>,
}

impl Step {
    pub fn new(heading: &str, label: &str) -> Self {
        Self {
            heading: Some(heading.to_string()),
            fields: Vec::new(),
            advance_label: Some(label.to_string()),
            signal: PageSignal::Clear,
            group_entries: 0,
            group_template: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: WizardField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_signal(mut self, signal: PageSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_group(mut self, existing: usize, template: Vec<WizardField>) -> Self {
        self.group_entries = existing;
        self.group_template = template;
        self
    }
}

/// 一个职位的页面脚本
#[derive(Debug, Clone)]
pub struct JobScript {
    pub description: String,
    pub has_wizard: bool,
    pub steps: Vec<Step>,
}

impl Default for JobScript {
    fn default() -> Self {
        Self {
            description: "Sell things to people.".to_string(),
            has_wizard: true,
            steps: vec![Step::new("Contact info", "Submit application")],
        }
    }
}

#[derive(Default)]
struct FakeState {
    /// (角色, 地点) -> 每页的结果
    pages: HashMap<(String, String), Vec<JobListView>>,
    scripts: HashMap<String, JobScript>,
    current_page: Option<JobListView>,
    current_job: Option<String>,
    step: usize,
    searches: Vec<(String, String, u32)>,
    opened: Vec<String>,
    filled: Vec<(String, FieldValue)>,
    follow: Vec<bool>,
    discards: usize,
    /// 当前步骤可见的分组条目数，首次访问时取自脚本
    groups: Option<usize>,
    group_calls: Vec<String>,
    /// 打开该职位时触发取消
    cancel_on_open: Option<(String, CancellationToken)>,
}

/// 脚本化的站点驱动
#[derive(Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某个角色 × 地点设置结果页，超出的页码视为没有更多结果
    pub fn with_pages(self, role: &str, location: &str, pages: Vec<JobListView>) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert((role.to_string(), location.to_string()), pages);
        self
    }

    pub fn with_script(self, job: &JobSummary, script: JobScript) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(job.url.clone(), script);
        self
    }

    /// 打开 `job` 时取消运行，模拟用户在职位处理中途按下 Ctrl-C
    pub fn cancel_when_opening(self, job: &JobSummary, cancel: CancellationToken) -> Self {
        self.state.lock().unwrap().cancel_on_open = Some((job.url.clone(), cancel));
        self
    }

    pub fn searches(&self) -> Vec<(String, String, u32)> {
        self.state.lock().unwrap().searches.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn filled(&self) -> Vec<(String, FieldValue)> {
        self.state.lock().unwrap().filled.clone()
    }

    pub fn follow_choices(&self) -> Vec<bool> {
        self.state.lock().unwrap().follow.clone()
    }

    pub fn discards(&self) -> usize {
        self.state.lock().unwrap().discards
    }

    /// 分组操作的调用顺序，如 `["clear", "fields 0", "add", "fields 1"]`
    pub fn group_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().group_calls.clone()
    }

    fn current_script(state: &FakeState) -> Result<JobScript> {
        let url = state
            .current_job
            .as_ref()
            .ok_or_else(|| anyhow!("没有打开的职位"))?;
        Ok(state.scripts.get(url).cloned().unwrap_or_default())
    }

    fn current_step(state: &FakeState) -> Result<Option<Step>> {
        Ok(Self::current_script(state)?.steps.get(state.step).cloned())
    }

    fn group_step(state: &mut FakeState) -> Result<(Step, usize)> {
        let step = Self::current_step(state)?.ok_or_else(|| anyhow!("向导已结束"))?;
        let visible = *state.groups.get_or_insert(step.group_entries);
        Ok((step, visible))
    }
}

#[async_trait]
impl BoardDriver for FakeDriver {
    async fn open_search(&self, role: &str, location: &str, page: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .searches
            .push((role.to_string(), location.to_string(), page));
        let view = state
            .pages
            .get(&(role.to_string(), location.to_string()))
            .and_then(|pages| pages.get(page as usize).cloned())
            .unwrap_or(JobListView::NoResults);
        state.current_page = Some(view);
        Ok(())
    }

    async fn find_job_list(&self) -> Result<JobListView> {
        self.state
            .lock()
            .unwrap()
            .current_page
            .clone()
            .ok_or_else(|| anyhow!("尚未打开搜索页"))
    }

    async fn open_job(&self, job: &JobSummary) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.opened.push(job.url.clone());
        state.current_job = Some(job.url.clone());
        state.step = 0;
        state.groups = None;
        if let Some((url, cancel)) = &state.cancel_on_open {
            if *url == job.url {
                cancel.cancel();
            }
        }
        Ok(())
    }

    async fn job_description(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(Self::current_script(&state)?.description)
    }

    async fn start_wizard(&self) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(Self::current_script(&state)?.has_wizard)
    }

    async fn find_step_heading(&self) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(Self::current_step(&state)?.and_then(|s| s.heading))
    }

    async fn fields(&self) -> Result<Vec<WizardField>> {
        let state = self.state.lock().unwrap();
        Ok(Self::current_step(&state)?
            .map(|s| s.fields)
            .unwrap_or_default())
    }

    async fn fill_field(&self, field_id: &str, value: &FieldValue) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .filled
            .push((field_id.to_string(), value.clone()));
        Ok(())
    }

    async fn clear_group_entries(&self) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let (_, visible) = Self::group_step(&mut state)?;
        state.groups = Some(0);
        state.group_calls.push("clear".to_string());
        Ok(visible)
    }

    async fn add_group_entry(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let (_, visible) = Self::group_step(&mut state)?;
        // 清空后页面仍保留一条空白表单
        state.groups = Some(visible.max(1) + 1);
        state.group_calls.push("add".to_string());
        Ok(())
    }

    async fn group_fields(&self, entry: usize) -> Result<Vec<WizardField>> {
        let mut state = self.state.lock().unwrap();
        let (step, visible) = Self::group_step(&mut state)?;
        state.group_calls.push(format!("fields {}", entry));
        if entry >= visible.max(1) {
            return Err(anyhow!("第 {} 条分组记录不存在", entry + 1));
        }
        Ok(step
            .group_template
            .into_iter()
            .map(|mut f| {
                f.id = format!("{}#{}", f.id, entry);
                f
            })
            .collect())
    }

    async fn advance_label(&self) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(Self::current_step(&state)?.and_then(|s| s.advance_label))
    }

    async fn advance(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.step += 1;
        state.groups = None;
        Ok(())
    }

    async fn page_signal(&self) -> Result<PageSignal> {
        let state = self.state.lock().unwrap();
        let script = Self::current_script(&state)?;
        Ok(state
            .step
            .checked_sub(1)
            .and_then(|i| script.steps.get(i))
            .map(|s| s.signal.clone())
            .unwrap_or(PageSignal::Clear))
    }

    async fn set_follow_company(&self, follow: bool) -> Result<()> {
        self.state.lock().unwrap().follow.push(follow);
        Ok(())
    }

    async fn discard_wizard(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.discards += 1;
        state.current_job = None;
        Ok(())
    }
}

/// 固定回答的协作方，记录调用次数
pub struct FixedCollaborator {
    pub answer: serde_json::Value,
    pub fit: bool,
    calls: AtomicUsize,
}

impl FixedCollaborator {
    pub fn new(answer: serde_json::Value, fit: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            fit,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collaborator for FixedCollaborator {
    async fn answer(&self, _: &AnswerRequest) -> Result<AnswerResponse, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AnswerResponse {
            result: self.answer.clone(),
            explanation: None,
        })
    }

    async fn evaluate_fit(&self, request: &FitRequest) -> Result<FitResponse, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FitResponse {
            result: self.fit,
            explanation: Some(format!("{} is not a match", request.job_title)),
        })
    }
}

/// 不等待的申请流程，未准备问题写到 `dir`
pub fn applicator(
    profile: Arc<Profile>,
    collaborator: Option<Arc<dyn Collaborator>>,
    dir: &Path,
) -> JobApplicator {
    let pipeline = AnswerPipeline::new(
        profile,
        collaborator,
        UnpreparedWriter::with_path(dir.join("unprepared_questions.txt")),
    );
    JobApplicator::new(pipeline, Pacer::instant())
}

/// 组装一个不等待、不打乱顺序的调度器，产物写到 `dir`
pub fn scheduler(
    driver: Arc<FakeDriver>,
    profile: Arc<Profile>,
    collaborator: Option<Arc<dyn Collaborator>>,
    dir: &Path,
) -> Scheduler {
    scheduler_with(driver, applicator(profile, collaborator, dir), dir)
}

pub fn scheduler_with(driver: Arc<FakeDriver>, applicator: JobApplicator, dir: &Path) -> Scheduler {
    let reports = ReportWriter::new(dir.join("applied.csv"), dir.join("failed.csv"));
    let driver: Arc<dyn BoardDriver> = driver;
    Scheduler::new(driver, applicator, reports, Pacer::instant()).without_shuffle()
}
