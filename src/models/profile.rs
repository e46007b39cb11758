//! 求职者档案
//!
//! 由外部配置工具生成的 TOML，运行期间只读

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 搜索目标：一个职位名称 + 若干地点，可选配额
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
    pub name: String,
    /// 为空时使用档案全局的地点列表
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub quota_limit: Option<u32>,
}

/// 节奏模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    #[default]
    Fast,
    Slow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blacklist {
    pub companies: Vec<String>,
    pub posters: Vec<String>,
    pub title_keywords: Vec<String>,
}

/// 是/否类问题的固定回答
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Checkboxes {
    pub drivers_licence: bool,
    pub requires_visa_sponsorship: bool,
    pub legally_authorized: bool,
    pub security_clearance: bool,
    pub certified: bool,
    pub urgent_start: bool,
    pub willing_to_commute: bool,
    pub background_check: bool,
    pub drug_test: bool,
    pub resident: bool,
    pub previously_employed: bool,
}

/// 技能年限表，`default` 必填
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub default: u32,
    #[serde(flatten)]
    pub skills: BTreeMap<String, u32>,
}

impl Experience {
    /// 按技能名查年限，查不到时用默认值
    ///
    /// 配置的技能名按整词匹配：它的词序列须连续出现在问题的技能名里，
    /// 多个命中时取词数最多的那个。"R" 不会命中 "kubernetes"，"Java" 不会命中 "javascript"。
    pub fn years_for(&self, skill: &str) -> u32 {
        let wanted = skill_tokens(skill);
        if wanted.is_empty() {
            return self.default;
        }
        self.skills
            .iter()
            .filter_map(|(name, years)| {
                let name = skill_tokens(name);
                let hit = !name.is_empty()
                    && wanted.windows(name.len()).any(|run| run == name.as_slice());
                hit.then_some((name.len(), *years))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, years)| years)
            .unwrap_or(self.default)
    }
}

/// 技能名切词：小写，保留 `+` 和 `#`（C++、C#）
fn skill_tokens(skill: &str) -> Vec<String> {
    skill
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthYear {
    pub month: u32,
    pub year: i32,
}

impl MonthYear {
    const MONTHS: [&'static str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    pub fn month_name(&self) -> &'static str {
        Self::MONTHS[(self.month.clamp(1, 12) - 1) as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub current: bool,
    pub start: MonthYear,
    #[serde(default)]
    pub end: Option<MonthYear>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub current: bool,
    pub start: MonthYear,
    #[serde(default)]
    pub end: Option<MonthYear>,
}

fn default_cooldown_days() -> u32 {
    30
}

/// 求职者档案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub targets: Vec<SearchTarget>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub blacklist: Blacklist,
    /// 个人信息，如 first_name / email / phone / city
    #[serde(default)]
    pub personal: BTreeMap<String, String>,
    #[serde(default)]
    pub checkboxes: Checkboxes,
    pub experience: Experience,
    /// 语言 -> 熟练度
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
    /// gender / race / veteran / disability -> 自我认定
    #[serde(default)]
    pub eeo: BTreeMap<String, String>,
    /// 问题原文（或片段）-> 固定回答
    #[serde(default)]
    pub custom_answers: BTreeMap<String, String>,
    #[serde(default)]
    pub salary_minimum: Option<u32>,
    #[serde(default)]
    pub gpa: Option<f32>,
    #[serde(default)]
    pub notice_period_days: Option<u32>,
    #[serde(default)]
    pub work_history: Vec<WorkEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub resume_path: Option<String>,
    #[serde(default)]
    pub pacing: PacingMode,
    #[serde(default)]
    pub debug: bool,
    /// 每次都重新选择联系邮箱，而不是沿用预填值
    #[serde(default)]
    pub verify_email: bool,
    #[serde(default = "default_cooldown_days")]
    pub cooldown_days: u32,
    #[serde(default)]
    pub start_page: u32,
    #[serde(default)]
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub fit_check: bool,
    #[serde(default)]
    pub follow_companies: bool,
}

impl Profile {
    /// 目标的有效地点列表
    pub fn locations_for<'a>(&'a self, target: &'a SearchTarget) -> &'a [String] {
        if target.locations.is_empty() {
            &self.locations
        } else {
            &target.locations
        }
    }

    pub fn personal(&self, key: &str) -> Option<&str> {
        self.personal
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn full_name(&self) -> String {
        [self.personal("first_name"), self.personal("last_name")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 发给协作方的档案摘要
    pub fn context_summary(&self) -> String {
        let mut lines = Vec::new();
        let name = self.full_name();
        if !name.is_empty() {
            lines.push(format!("Name: {}", name));
        }
        if let Some(headline) = self.personal("headline") {
            lines.push(format!("Headline: {}", headline));
        }
        if let Some(summary) = self.personal("summary") {
            lines.push(format!("Summary: {}", summary));
        }
        if let Some(city) = self.personal("city") {
            lines.push(format!("Location: {}", city));
        }
        if !self.experience.skills.is_empty() {
            let skills: Vec<String> = self
                .experience
                .skills
                .iter()
                .map(|(skill, years)| format!("{} ({} years)", skill, years))
                .collect();
            lines.push(format!("Skills: {}", skills.join(", ")));
        }
        lines.push(format!(
            "Default years of experience: {}",
            self.experience.default
        ));
        if !self.languages.is_empty() {
            let langs: Vec<String> = self
                .languages
                .iter()
                .map(|(lang, level)| format!("{} ({})", lang, level))
                .collect();
            lines.push(format!("Languages: {}", langs.join(", ")));
        }
        for job in &self.work_history {
            let until = if job.current {
                "present".to_string()
            } else {
                job.end
                    .map(|e| format!("{} {}", e.month_name(), e.year))
                    .unwrap_or_default()
            };
            lines.push(format!(
                "Work: {} at {} ({} {} - {})",
                job.title,
                job.company,
                job.start.month_name(),
                job.start.year,
                until
            ));
        }
        for school in &self.education {
            lines.push(format!(
                "Education: {} {} at {}",
                school.degree, school.major, school.school
            ));
        }
        lines.join("\n")
    }

    /// EEO 自我认定信息，附加到相关问题的上下文中
    pub fn eeo_context(&self) -> String {
        if self.eeo.is_empty() {
            return "No self-identification preferences configured; prefer declining to answer."
                .to_string();
        }
        self.eeo
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 加载后的一致性检查
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            bail!("档案中没有任何搜索目标");
        }
        for target in &self.targets {
            if target.name.trim().is_empty() {
                bail!("搜索目标名称不能为空");
            }
            if self.locations_for(target).is_empty() {
                bail!("搜索目标 {} 没有可用的地点", target.name);
            }
        }
        let dates = self
            .work_history
            .iter()
            .flat_map(|w| std::iter::once(w.start).chain(w.end))
            .chain(
                self.education
                    .iter()
                    .flat_map(|e| std::iter::once(e.start).chain(e.end)),
            );
        for date in dates {
            if !(1..=12).contains(&date.month) {
                bail!("月份 {} 超出范围 [1, 12]", date.month);
            }
        }
        Ok(())
    }
}
