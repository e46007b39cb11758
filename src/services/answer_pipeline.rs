//! 回答解析管线 - 业务能力层
//!
//! 对分类后的问题按顺序尝试以下策略，命中即停止：
//! 1. 自定义问答表
//! 2. 档案中的确定性规则（是/否、年限、语言、EEO、薪资等）
//! 3. 远程协作方（仅在没有确定性规则时调用，超时不重试）
//! 4. 安全默认值
//!
//! 走到第 3/4 步的问题都会记入未准备问题文件。

use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{ControlKind, FieldValue, JobSummary, Profile, Question};
use crate::services::classifier::{
    classify, find_custom_answer, Category, PersonalField, ResponseType, YesNoTopic,
};
use crate::services::collaborator::{
    AnswerRequest, Collaborator, CollaboratorError, FitRequest, FitResponse,
};
use crate::services::unprepared_writer::UnpreparedWriter;

/// 自由文本的占位回答
pub const TEXT_PLACEHOLDER: &str = "Please refer to my resume.";

const EEO_DECLINE_TEXT: &str = "Decline to self-identify";

const CONSERVATIVE_MARKERS: &[&str] = &[
    "decline",
    "prefer not",
    "not wish",
    "don't wish",
    "do not wish",
    "choose not",
    "not to answer",
    "not to disclose",
    "rather not",
    "not specified",
];

/// 回答来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Custom,
    Profile,
    Collaborator,
    SafeDefault,
}

impl AnswerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerSource::Custom => "custom",
            AnswerSource::Profile => "profile",
            AnswerSource::Collaborator => "collaborator",
            AnswerSource::SafeDefault => "safe_default",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub value: FieldValue,
    pub source: AnswerSource,
    pub category: Category,
}

/// 回答解析管线
///
/// 职责：
/// - 只处理单个问题
/// - 协作方失败时降级到下一个策略，从不向上抛错
pub struct AnswerPipeline {
    profile: Arc<Profile>,
    collaborator: Option<Arc<dyn Collaborator>>,
    timeout: Duration,
    max_tokens: u32,
    unprepared: UnpreparedWriter,
}

impl AnswerPipeline {
    pub fn new(
        profile: Arc<Profile>,
        collaborator: Option<Arc<dyn Collaborator>>,
        unprepared: UnpreparedWriter,
    ) -> Self {
        Self {
            profile,
            collaborator,
            timeout: Duration::from_secs(30),
            max_tokens: 256,
            unprepared,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// 为一个问题给出回答
    ///
    /// # 参数
    /// - `question`: 问题
    /// - `job_context`: 当前职位的简短描述，附加到协作方上下文
    pub async fn resolve(&self, question: &Question, job_context: &str) -> Answer {
        let category = classify(question, &self.profile);
        debug!("问题分类: {:?} <- {}", category, question.label);

        if let Category::Custom(_) = category {
            if let Some(value) = self.custom_answer(question) {
                return Answer {
                    value,
                    source: AnswerSource::Custom,
                    category,
                };
            }
            warn!("自定义回答与选项不匹配，继续尝试其他策略: {}", question.label);
        }

        if let Some(value) = self.profile_rule(&category, question) {
            return Answer {
                value,
                source: AnswerSource::Profile,
                category,
            };
        }

        let (value, source) = match self.ask_collaborator(&category, question, job_context).await {
            Some(value) => (value, AnswerSource::Collaborator),
            None => (
                safe_default(question, &self.profile),
                AnswerSource::SafeDefault,
            ),
        };

        if let Err(e) = self.unprepared.write(question, &value, source.as_str()) {
            warn!("写入未准备问题失败: {}", e);
        }

        Answer {
            value,
            source,
            category,
        }
    }

    /// 适配度评估；没有协作方或调用失败时返回 None
    pub async fn evaluate_fit(&self, job: &JobSummary, description: &str) -> Option<FitResponse> {
        let collaborator = self.collaborator.as_ref()?;
        let request = FitRequest {
            context: self.profile.context_summary(),
            job_title: job.title.clone(),
            job_description: description.to_string(),
        };
        match tokio::time::timeout(self.timeout, collaborator.evaluate_fit(&request)).await {
            Ok(Ok(response)) => Some(response),
            Ok(Err(e)) => {
                warn!("适配度评估失败，按可申请处理: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "{}，按可申请处理",
                    CollaboratorError::Timeout(self.timeout.as_secs())
                );
                None
            }
        }
    }

    fn custom_answer(&self, question: &Question) -> Option<FieldValue> {
        let (_, text) = find_custom_answer(&question.label, &self.profile.custom_answers)?;
        shape_text(question, text)
    }

    fn profile_rule(&self, category: &Category, question: &Question) -> Option<FieldValue> {
        let p = &self.profile;
        match category {
            Category::Custom(_) | Category::Generic(_) => None,
            Category::YesNo(topic) => Some(yes_no(question, self.checkbox(*topic), p)),
            Category::YearsOfExperience(skill) => {
                numeric_answer(question, p.experience.years_for(skill))
            }
            Category::Language(lang) => {
                let level = lookup_ignore_case(&p.languages, lang)?;
                shape_text(question, level)
            }
            Category::Gpa => shape_text(question, &p.gpa?.to_string()),
            Category::Salary => numeric_answer(question, p.salary_minimum?),
            Category::NoticePeriod => notice_answer(question, p.notice_period_days?),
            Category::Eeo(topic) => eeo_answer(question, lookup_ignore_case(&p.eeo, topic.key())),
            Category::Personal(field) => {
                let value = personal_value(p, *field)?;
                shape_text(question, &value)
            }
        }
    }

    fn checkbox(&self, topic: YesNoTopic) -> bool {
        let c = &self.profile.checkboxes;
        match topic {
            YesNoTopic::DriversLicence => c.drivers_licence,
            YesNoTopic::VisaSponsorship => c.requires_visa_sponsorship,
            YesNoTopic::WorkAuthorization => c.legally_authorized,
            YesNoTopic::SecurityClearance => c.security_clearance,
            YesNoTopic::Certification => c.certified,
            YesNoTopic::UrgentStart => c.urgent_start,
            YesNoTopic::Commute => c.willing_to_commute,
            YesNoTopic::BackgroundCheck => c.background_check,
            YesNoTopic::DrugTest => c.drug_test,
            YesNoTopic::Residency => c.resident,
            YesNoTopic::PriorEmployment => c.previously_employed,
        }
    }

    async fn ask_collaborator(
        &self,
        category: &Category,
        question: &Question,
        job_context: &str,
    ) -> Option<FieldValue> {
        let collaborator = self.collaborator.as_ref()?;
        let response_type = ResponseType::for_kind(question.kind)?;
        if response_type == ResponseType::Choice && question.options.is_empty() {
            return None;
        }

        let mut context = self.profile.context_summary();
        if !job_context.is_empty() {
            context.push_str("\n\n");
            context.push_str(job_context);
        }
        if category.is_eeo() {
            context.push_str("\n\nSelf-identification preferences:\n");
            context.push_str(&self.profile.eeo_context());
        }

        let request = AnswerRequest {
            context,
            question: question.label.clone(),
            response_type,
            options: (response_type == ResponseType::Choice).then(|| {
                question
                    .options
                    .iter()
                    .cloned()
                    .enumerate()
                    .collect::<Vec<_>>()
            }),
            max_tokens: self.max_tokens,
        };

        let result = match tokio::time::timeout(self.timeout, collaborator.answer(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout(self.timeout.as_secs())),
        }
        .and_then(|response| interpret_response(question, response_type, &response.result));

        match result {
            Ok(value) => {
                info!("🤖 协作方回答: {} -> {}", question.label, value.display_text());
                Some(value)
            }
            Err(e) => {
                warn!("协作方回答不可用，改用默认值: {}", e);
                None
            }
        }
    }
}

/// 把协作方的结果转换成字段值
fn interpret_response(
    question: &Question,
    response_type: ResponseType,
    result: &serde_json::Value,
) -> Result<FieldValue, CollaboratorError> {
    match response_type {
        ResponseType::Text => {
            let text = match result {
                serde_json::Value::String(s) => s.trim().to_string(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            if text.is_empty() {
                Err(CollaboratorError::BadResponse("空文本回答".to_string()))
            } else {
                Ok(FieldValue::Text(text))
            }
        }
        ResponseType::Numeric => json_integer(result)
            .map(|n| FieldValue::Text(n.to_string()))
            .ok_or_else(|| CollaboratorError::BadResponse(format!("不是数字: {}", result))),
        ResponseType::Choice => {
            let index = json_integer(result)
                .ok_or_else(|| CollaboratorError::BadResponse(format!("不是选项索引: {}", result)))?;
            let len = question.options.len();
            if index < 0 || index as usize >= len {
                return Err(CollaboratorError::IndexOutOfRange { index, len });
            }
            Ok(FieldValue::Choice(question.options[index as usize].clone()))
        }
    }
}

fn json_integer(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok().or_else(|| first_integer(s)),
        _ => None,
    }
}

fn integer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

fn decimal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"))
}

/// 取文本中第一段数字
pub fn first_integer(text: &str) -> Option<i64> {
    integer_regex()
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

fn lookup_ignore_case<'a>(
    map: &'a std::collections::BTreeMap<String, String>,
    key: &str,
) -> Option<&'a str> {
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.trim().is_empty())
}

fn is_truthy(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "1" | "checked" | "agree"
    )
}

/// 按文字在选项中找最接近的一项
pub fn match_option(options: &[String], wanted: &str) -> Option<String> {
    let wanted = wanted.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    let lowered: Vec<String> = options.iter().map(|o| o.trim().to_lowercase()).collect();

    let position = lowered
        .iter()
        .position(|o| *o == wanted)
        .or_else(|| lowered.iter().position(|o| o.starts_with(&wanted)))
        .or_else(|| lowered.iter().position(|o| o.contains(&wanted)))
        .or_else(|| {
            lowered
                .iter()
                .position(|o| !o.is_empty() && wanted.contains(o.as_str()))
        })?;
    Some(options[position].clone())
}

/// 把一段文字塞进对应控件
fn shape_text(question: &Question, text: &str) -> Option<FieldValue> {
    match question.kind {
        ControlKind::SingleSelect | ControlKind::Dropdown => {
            match_option(&question.options, text).map(FieldValue::Choice)
        }
        ControlKind::Checkbox => Some(FieldValue::Check(is_truthy(text))),
        ControlKind::Numeric => decimal_regex()
            .find(text)
            .map(|m| FieldValue::Text(m.as_str().to_string())),
        ControlKind::File => Some(FieldValue::File(text.to_string())),
        ControlKind::Text | ControlKind::Date => Some(FieldValue::Text(text.to_string())),
    }
}

/// 是/否题总能由档案给出回答
///
/// 选项先按首词 Yes/No 匹配，再按是否带否定词区分，
/// 都不行时"是"取第一项、"否"取最后一项。
fn yes_no(question: &Question, answer: bool, profile: &Profile) -> FieldValue {
    match question.kind {
        ControlKind::SingleSelect | ControlKind::Dropdown if !question.options.is_empty() => {
            FieldValue::Choice(yes_no_option(&question.options, answer))
        }
        ControlKind::Checkbox => FieldValue::Check(answer),
        ControlKind::Text => FieldValue::Text(if answer { "Yes" } else { "No" }.to_string()),
        ControlKind::Numeric => FieldValue::Text(if answer { "1" } else { "0" }.to_string()),
        _ => safe_default(question, profile),
    }
}

fn yes_no_option(options: &[String], answer: bool) -> String {
    let word = if answer { "yes" } else { "no" };
    let by_first_word = options.iter().find(|option| {
        let first_word: String = option
            .trim()
            .chars()
            .take_while(|c| c.is_alphabetic())
            .collect();
        first_word.eq_ignore_ascii_case(word)
    });
    let by_negation = || {
        options
            .iter()
            .find(|option| is_negative_option(option) != answer)
    };
    let by_position = || if answer { options.first() } else { options.last() };
    by_first_word
        .or_else(by_negation)
        .or_else(by_position)
        .cloned()
        .unwrap_or_default()
}

fn is_negative_option(option: &str) -> bool {
    const NEGATIONS: &[&str] = &[
        "not", "no", "never", "cannot", "can't", "don't", "dont", "won't", "unable", "none",
    ];
    option
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|w| NEGATIONS.contains(&w))
}

fn numeric_answer(question: &Question, value: u32) -> Option<FieldValue> {
    match question.kind {
        ControlKind::SingleSelect | ControlKind::Dropdown => {
            numeric_option(&question.options, i64::from(value)).map(FieldValue::Choice)
        }
        ControlKind::Text | ControlKind::Numeric => Some(FieldValue::Text(value.to_string())),
        ControlKind::Checkbox | ControlKind::Date | ControlKind::File => None,
    }
}

/// 选出下限不超过 `value` 的最大区间，如 "0-1 years" / "2-4 years" / "5+ years"
fn numeric_option(options: &[String], value: i64) -> Option<String> {
    let parsed: Vec<(i64, &String)> = options
        .iter()
        .filter_map(|o| first_integer(o).map(|n| (n, o)))
        .collect();
    parsed
        .iter()
        .filter(|(n, _)| *n <= value)
        .max_by_key(|(n, _)| *n)
        .or_else(|| parsed.iter().min_by_key(|(n, _)| *n))
        .map(|(_, o)| (*o).clone())
}

/// 选项换算成天数："Immediately" → 0，"2 weeks" → 14，"1 month" → 30
fn option_days(option: &str) -> Option<i64> {
    let lower = option.to_lowercase();
    if lower.contains("immediate") || lower.starts_with("none") {
        return Some(0);
    }
    let n = first_integer(&lower)?;
    let unit = if lower.contains("month") {
        30
    } else if lower.contains("week") {
        7
    } else {
        1
    };
    Some(n * unit)
}

fn notice_answer(question: &Question, days: u32) -> Option<FieldValue> {
    match question.kind {
        ControlKind::SingleSelect | ControlKind::Dropdown => {
            let parsed: Vec<(i64, &String)> = question
                .options
                .iter()
                .filter_map(|o| option_days(o).map(|d| (d, o)))
                .collect();
            parsed
                .iter()
                .filter(|(d, _)| *d <= i64::from(days))
                .max_by_key(|(d, _)| *d)
                .or_else(|| parsed.iter().min_by_key(|(d, _)| *d))
                .map(|(_, o)| FieldValue::Choice((*o).clone()))
        }
        ControlKind::Numeric => Some(FieldValue::Text(days.to_string())),
        ControlKind::Text => Some(FieldValue::Text(format!("{} days", days))),
        ControlKind::Checkbox | ControlKind::Date | ControlKind::File => None,
    }
}

/// 选项中最保守（不表态）的一项，找不到时取最后一项
fn conservative_option(options: &[String]) -> Option<String> {
    options
        .iter()
        .find(|o| {
            let lower = o.to_lowercase();
            CONSERVATIVE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .or_else(|| options.last())
        .cloned()
}

fn eeo_answer(question: &Question, configured: Option<&str>) -> Option<FieldValue> {
    match question.kind {
        ControlKind::SingleSelect | ControlKind::Dropdown => configured
            .and_then(|value| match_option(&question.options, value))
            .or_else(|| conservative_option(&question.options))
            .map(FieldValue::Choice),
        ControlKind::Text => Some(FieldValue::Text(
            configured.unwrap_or(EEO_DECLINE_TEXT).to_string(),
        )),
        ControlKind::Checkbox => Some(FieldValue::Check(configured.map(is_truthy).unwrap_or(false))),
        ControlKind::Numeric | ControlKind::Date | ControlKind::File => None,
    }
}

fn personal_value(profile: &Profile, field: PersonalField) -> Option<String> {
    let direct = profile.personal(field.key()).map(str::to_string);
    match field {
        PersonalField::FullName => direct.or_else(|| {
            let name = profile.full_name();
            (!name.is_empty()).then_some(name)
        }),
        PersonalField::PhoneCountryCode => {
            direct.or_else(|| profile.personal("country").map(str::to_string))
        }
        _ => direct,
    }
}

/// 最后的兜底值
pub fn safe_default(question: &Question, profile: &Profile) -> FieldValue {
    match question.kind {
        ControlKind::SingleSelect | ControlKind::Dropdown => question
            .options
            .last()
            .cloned()
            .map(FieldValue::Choice)
            .unwrap_or_else(|| FieldValue::Text(TEXT_PLACEHOLDER.to_string())),
        ControlKind::Numeric => FieldValue::Text("0".to_string()),
        ControlKind::Text => FieldValue::Text(TEXT_PLACEHOLDER.to_string()),
        ControlKind::Date => {
            FieldValue::Text(chrono::Local::now().format("%m/%d/%Y").to_string())
        }
        ControlKind::Checkbox => FieldValue::Check(true),
        ControlKind::File => FieldValue::File(profile.resume_path.clone().unwrap_or_default()),
    }
}
