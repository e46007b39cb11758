//! 招聘站点能力接口 - 基础设施层
//!
//! 流程层只依赖这个 trait，不认识具体的页面结构。
//! 真实浏览器由 `DomDriver` 实现，测试中用脚本化的假实现替换。

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{FieldValue, JobSummary, WizardField};

/// 搜索结果页的职位列表
#[derive(Debug, Clone, PartialEq)]
pub enum JobListView {
    /// 正常列表
    Listings(Vec<JobSummary>),
    /// 站点明确提示"没有更多结果"
    NoResults,
    /// 列表容器找不到（页面结构变化）
    Missing,
}

/// 每次点击"下一步"后检查的页面级信号
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSignal {
    Clear,
    /// 表单校验失败横幅，附带横幅文字
    ValidationError(String),
    /// 当日申请次数已用完
    DailyLimit,
}

/// 招聘站点能力
///
/// 职责：
/// - 只暴露"看"和"点"的能力
/// - 不做任何业务判断（黑名单、配额、回答策略都在上层）
#[async_trait]
pub trait BoardDriver: Send + Sync {
    /// 打开某个角色 × 地点的第 `page` 页（从 0 开始）
    async fn open_search(&self, role: &str, location: &str, page: u32) -> Result<()>;

    async fn find_job_list(&self) -> Result<JobListView>;

    async fn open_job(&self, job: &JobSummary) -> Result<()>;

    async fn job_description(&self) -> Result<String>;

    /// 点击页内申请入口；没有入口时返回 false
    async fn start_wizard(&self) -> Result<bool>;

    async fn find_step_heading(&self) -> Result<Option<String>>;

    /// 当前步骤中的全部字段
    async fn fields(&self) -> Result<Vec<WizardField>>;

    /// 按标签查找字段（忽略大小写的包含匹配）
    async fn find_field(&self, label: &str) -> Result<Option<WizardField>> {
        let wanted = label.trim().to_lowercase();
        Ok(self
            .fields()
            .await?
            .into_iter()
            .find(|f| f.question.label.to_lowercase().contains(&wanted)))
    }

    async fn fill_field(&self, field_id: &str, value: &FieldValue) -> Result<()>;

    /// 删除可重复分组中已有的条目，返回删除数量
    async fn clear_group_entries(&self) -> Result<usize>;

    /// 点击"添加另一条"
    async fn add_group_entry(&self) -> Result<()>;

    /// 可重复分组中第 `entry` 条（从 0 开始）的字段
    async fn group_fields(&self, entry: usize) -> Result<Vec<WizardField>>;

    /// 当前"前进"按钮上的文字
    async fn advance_label(&self) -> Result<Option<String>>;

    async fn advance(&self) -> Result<()>;

    async fn page_signal(&self) -> Result<PageSignal>;

    async fn set_follow_company(&self, follow: bool) -> Result<()>;

    /// 放弃当前向导，让下一个职位从干净的状态开始
    async fn discard_wizard(&self) -> Result<()>;
}

/// 前进按钮文字是否表示最终提交
pub fn is_submit_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    lower.contains("submit") && !lower.contains("review")
}
