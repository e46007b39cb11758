use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// 结果列表中的一条职位摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub location: String,
    /// 规范化后的 URL（已去掉查询参数）
    pub url: String,
}

impl JobSummary {
    /// 构造时即规范化 URL
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        poster: Option<String>,
        location: impl Into<String>,
        url: &str,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            poster,
            location: location.into(),
            url: normalize_url(url),
        }
    }
}

impl Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.title, self.company)
    }
}

/// 去掉查询参数和片段，使带不同追踪参数的同一职位得到相同的键
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let normalized = match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or(trimmed)
            .to_string(),
    };
    normalized.trim_end_matches('/').to_string()
}

/// 跳过职位的原因，按判定优先级排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    BlacklistedCompany(String),
    BlacklistedPoster(String),
    BlacklistedTitle(String),
    AlreadySeen,
    RecentlyApplied,
    /// 适配度评估给出否定建议
    PoorFit(String),
    /// 页面上没有站内申请入口
    NoInPageApplication,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BlacklistedCompany(c) => write!(f, "公司在黑名单中: {}", c),
            SkipReason::BlacklistedPoster(p) => write!(f, "发布人在黑名单中: {}", p),
            SkipReason::BlacklistedTitle(k) => write!(f, "职位标题包含屏蔽词: {}", k),
            SkipReason::AlreadySeen => write!(f, "本次运行已处理过"),
            SkipReason::RecentlyApplied => write!(f, "冷却期内已申请"),
            SkipReason::PoorFit(why) => write!(f, "适配度评估建议跳过: {}", why),
            SkipReason::NoInPageApplication => write!(f, "没有站内申请入口"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_strips_tracking_params() {
        assert_eq!(
            normalize_url("https://board.example.com/jobs/view/123/?refId=abc&trk=x#top"),
            "https://board.example.com/jobs/view/123"
        );
        assert_eq!(
            normalize_url("https://board.example.com/jobs/view/123"),
            normalize_url("https://board.example.com/jobs/view/123?currentJobId=9")
        );
    }

    #[test]
    fn test_normalize_url_relative_path() {
        assert_eq!(normalize_url("/jobs/view/77?x=1"), "/jobs/view/77");
    }
}
