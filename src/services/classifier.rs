//! 字段分类 - 业务能力层
//!
//! 根据控件类型和标签文字，把向导字段归入语义类别。
//! 匹配顺序：自定义问答表 → 类别关键字 → 通用文本/数字/选择。

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::{ControlKind, Profile, Question};

/// 发给协作方的回答类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Text,
    Numeric,
    Choice,
}

impl ResponseType {
    /// 由控件类型推断；复选框、日期、文件不走协作方
    pub fn for_kind(kind: ControlKind) -> Option<Self> {
        match kind {
            ControlKind::Text => Some(ResponseType::Text),
            ControlKind::Numeric => Some(ResponseType::Numeric),
            ControlKind::SingleSelect | ControlKind::Dropdown => Some(ResponseType::Choice),
            ControlKind::Date | ControlKind::Checkbox | ControlKind::File => None,
        }
    }
}

/// 是/否类问题的主题，对应档案中的 `checkboxes`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YesNoTopic {
    DriversLicence,
    VisaSponsorship,
    WorkAuthorization,
    SecurityClearance,
    Certification,
    UrgentStart,
    Commute,
    BackgroundCheck,
    DrugTest,
    Residency,
    PriorEmployment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EeoTopic {
    Gender,
    Race,
    Veteran,
    Disability,
    /// 其他受保护类别（宗教、国籍、性取向等）
    ProtectedClass,
}

impl EeoTopic {
    /// 档案 `eeo` 表中的键
    pub fn key(self) -> &'static str {
        match self {
            EeoTopic::Gender => "gender",
            EeoTopic::Race => "race",
            EeoTopic::Veteran => "veteran",
            EeoTopic::Disability => "disability",
            EeoTopic::ProtectedClass => "protected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonalField {
    Email,
    PhoneCountryCode,
    Phone,
    Country,
    FirstName,
    LastName,
    FullName,
    City,
    Street,
    State,
    PostalCode,
    LinkedIn,
    Website,
    Headline,
}

impl PersonalField {
    /// 档案 `personal` 表中的键
    pub fn key(self) -> &'static str {
        match self {
            PersonalField::Email => "email",
            PersonalField::PhoneCountryCode => "phone_country_code",
            PersonalField::Phone => "phone",
            PersonalField::Country => "country",
            PersonalField::FirstName => "first_name",
            PersonalField::LastName => "last_name",
            PersonalField::FullName => "full_name",
            PersonalField::City => "city",
            PersonalField::Street => "street",
            PersonalField::State => "state",
            PersonalField::PostalCode => "postal_code",
            PersonalField::LinkedIn => "linkedin",
            PersonalField::Website => "website",
            PersonalField::Headline => "headline",
        }
    }
}

/// 字段语义类别
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// 命中自定义问答表，携带命中的键
    Custom(String),
    YesNo(YesNoTopic),
    YearsOfExperience(String),
    Language(String),
    Gpa,
    Salary,
    NoticePeriod,
    Eeo(EeoTopic),
    Personal(PersonalField),
    /// 未识别
    Generic(ControlKind),
}

impl Category {
    pub fn is_eeo(&self) -> bool {
        matches!(self, Category::Eeo(_))
    }
}

const COMMON_LANGUAGES: &[&str] = &[
    "english", "german", "french", "spanish", "italian", "portuguese", "dutch", "polish",
    "russian", "chinese", "mandarin", "cantonese", "japanese", "korean", "arabic", "hindi",
    "turkish", "swedish", "danish", "norwegian", "finnish",
];

/// 按词边界匹配的标签
///
/// 小写后把标点换成空格，首尾各补一个空格，
/// 这样 `" reside"` 不会命中 "president"，`" visa "` 不会命中 "advisable"。
struct Label {
    text: String,
}

impl Label {
    fn new(label: &str) -> Self {
        Self {
            text: format!(" {} ", words(label).join(" ")),
        }
    }

    /// 词首匹配，允许词干（"relocat" 命中 "relocate"）
    fn stem(&self, needles: &[&str]) -> bool {
        needles
            .iter()
            .any(|n| self.text.contains(&format!(" {}", words(n).join(" "))))
    }

    /// 整词或整词组匹配
    fn word(&self, needles: &[&str]) -> bool {
        needles
            .iter()
            .any(|n| self.text.contains(&format!(" {} ", words(n).join(" "))))
    }
}

/// 对问题分类
pub fn classify(question: &Question, profile: &Profile) -> Category {
    let label = question.normalized_label();

    if let Some((key, _)) = find_custom_answer(&label, &profile.custom_answers) {
        return Category::Custom(key.to_string());
    }

    let l = Label::new(&label);

    if l.stem(&[
        "driver's licen",
        "drivers licen",
        "driver licen",
        "driving licen",
        "driver’s licen",
    ]) {
        return Category::YesNo(YesNoTopic::DriversLicence);
    }
    if l.stem(&["sponsor"]) || l.word(&["visa", "visas"]) {
        return Category::YesNo(YesNoTopic::VisaSponsorship);
    }
    if l.stem(&[
        "legally authorized",
        "legally authorised",
        "authorized to work",
        "authorised to work",
        "eligible to work",
        "legally eligible",
        "right to work",
        "work authorization",
        "work authorisation",
        "work permit",
    ]) {
        return Category::YesNo(YesNoTopic::WorkAuthorization);
    }
    if l.word(&["clearance"]) {
        return Category::YesNo(YesNoTopic::SecurityClearance);
    }
    if l.stem(&["certif"]) {
        return Category::YesNo(YesNoTopic::Certification);
    }
    if l.stem(&[
        "start immediately",
        "urgent",
        "immediately available",
        "available immediately",
        "immediate start",
    ]) || l.word(&["asap"])
    {
        return Category::YesNo(YesNoTopic::UrgentStart);
    }
    if l.stem(&["commut", "relocat", "remote", "on-site", "onsite", "in-office", "in office"])
        || l.word(&["hybrid"])
    {
        return Category::YesNo(YesNoTopic::Commute);
    }
    if l.stem(&["background check", "background screening", "criminal"]) {
        return Category::YesNo(YesNoTopic::BackgroundCheck);
    }
    if l.word(&["drug", "drugs", "drug test", "drug screen"]) {
        return Category::YesNo(YesNoTopic::DrugTest);
    }
    if l.word(&["reside", "resides", "residing", "residency", "resident", "currently live", "currently living"]) {
        return Category::YesNo(YesNoTopic::Residency);
    }
    if l.stem(&[
        "previously worked",
        "previously employed",
        "former employee",
        "worked for",
        "been employed by",
        "ever worked at",
    ]) {
        return Category::YesNo(YesNoTopic::PriorEmployment);
    }
    if l.stem(&["experience"])
        && (l.stem(&["year", "how many", "how much"]) || question.kind == ControlKind::Numeric)
    {
        return Category::YearsOfExperience(experience_skill(&label));
    }
    if l.stem(&["proficien", "fluent", "fluency", "language", "speak"]) {
        if let Some(lang) = mentioned_language(&l, &profile.languages) {
            return Category::Language(lang);
        }
    }
    if l.word(&["gpa"]) || l.stem(&["grade point"]) {
        return Category::Gpa;
    }
    if l.stem(&[
        "salary",
        "compensation",
        "pay expectation",
        "expected pay",
        "desired pay",
        "hourly rate",
        "expected ctc",
        "remuneration",
    ]) {
        return Category::Salary;
    }
    if l.word(&["notice"]) && !l.word(&["privacy", "policy", "acknowledge"]) {
        return Category::NoticePeriod;
    }
    if let Some(topic) = eeo_topic(&l) {
        return Category::Eeo(topic);
    }
    if let Some(field) = personal_field(&l, &label) {
        return Category::Personal(field);
    }

    Category::Generic(question.kind)
}

/// 在自定义问答表中查找：先精确匹配，再取最长的子串匹配
pub fn find_custom_answer<'a>(
    label: &str,
    answers: &'a BTreeMap<String, String>,
) -> Option<(&'a str, &'a str)> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    answers
        .iter()
        .find(|(key, _)| key.trim().to_lowercase() == label)
        .or_else(|| {
            answers
                .iter()
                .filter(|(key, _)| {
                    let key = key.trim().to_lowercase();
                    !key.is_empty() && label.contains(&key)
                })
                .max_by_key(|(key, _)| key.trim().len())
        })
        .map(|(k, v)| (k.as_str(), v.as_str()))
}

fn words(label: &str) -> Vec<String> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn experience_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"years of (?:professional |work |hands-on )?(.+?) experience")
                .expect("valid regex"),
            Regex::new(r"experience (?:do you have )?(?:with|in|using|working with|on) (.+?)(?:\?|\.|:|$)")
                .expect("valid regex"),
            Regex::new(r"(.+?) experience").expect("valid regex"),
        ]
    })
}

const SKILL_STOPWORDS: &[&str] = &["of", "in", "with", "as", "a", "an", "the", "any", "relevant"];

/// 从"How many years of X experience"之类的句子里取出技能名
fn experience_skill(label: &str) -> String {
    const FILLER: &[&str] = &[
        "how many years",
        "how many",
        "years of",
        "total",
        "do you have",
        "you have",
        "your",
        "work",
        "professional",
    ];
    for pattern in experience_patterns() {
        if let Some(caps) = pattern.captures(label) {
            let mut skill = caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string();
            for filler in FILLER {
                skill = skill.replace(filler, " ");
            }
            let skill = skill
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !skill.is_empty() && !skill.split(' ').all(|w| SKILL_STOPWORDS.contains(&w)) {
                return skill;
            }
        }
    }
    String::new()
}

fn mentioned_language(label: &Label, configured: &BTreeMap<String, String>) -> Option<String> {
    configured
        .keys()
        .find(|lang| label.word(&[lang.to_lowercase().as_str()]))
        .cloned()
        .or_else(|| {
            COMMON_LANGUAGES
                .iter()
                .find(|lang| label.word(&[**lang]))
                .map(|lang| lang.to_string())
        })
}

fn eeo_topic(l: &Label) -> Option<EeoTopic> {
    let has = |needles: &[&str]| l.stem(needles);
    let has_word = |needles: &[&str]| l.word(needles);

    if has_word(&["gender", "sex", "pronouns", "pronoun", "transgender"])
        || has(&["identify as", "gender identity"])
    {
        return Some(EeoTopic::Gender);
    }
    if has_word(&["race", "racial", "ethnicity", "ethnic", "hispanic", "latino", "latinx"])
        || has(&["heritage"])
    {
        return Some(EeoTopic::Race);
    }
    if has(&["veteran", "military service", "armed forces", "uniformed service"]) {
        return Some(EeoTopic::Veteran);
    }
    if has(&["disabilit", "disabled", "impairment", "handicap"]) {
        return Some(EeoTopic::Disability);
    }
    if has(&[
        "sexual orientation",
        "lgbt",
        "religion",
        "religious",
        "national origin",
        "protected class",
        "equal employment",
        "equal opportunity",
        "affirmative action",
        "self-identif",
        "self identif",
        "diversity",
    ]) || has_word(&["eeo", "eeoc"])
    {
        return Some(EeoTopic::ProtectedClass);
    }
    None
}

fn personal_field(l: &Label, label: &str) -> Option<PersonalField> {
    let has = |needles: &[&str]| l.stem(needles);
    let has_word = |needles: &[&str]| l.word(needles);

    if has(&["e-mail", "email"]) {
        return Some(PersonalField::Email);
    }
    if has(&["country code", "dialing code"]) {
        return Some(PersonalField::PhoneCountryCode);
    }
    if has(&["phone", "mobile", "telephone"]) || has_word(&["cell"]) {
        return Some(PersonalField::Phone);
    }
    if has(&["country"]) {
        return Some(PersonalField::Country);
    }
    if has(&["first name", "given name", "firstname"]) {
        return Some(PersonalField::FirstName);
    }
    if has(&["last name", "surname", "family name", "lastname"]) {
        return Some(PersonalField::LastName);
    }
    if has(&["full name", "your name"]) || label == "name" {
        return Some(PersonalField::FullName);
    }
    if has_word(&["city", "town"]) || has(&["location (city)"]) {
        return Some(PersonalField::City);
    }
    if has(&["street", "address line", "address"]) {
        return Some(PersonalField::Street);
    }
    if has_word(&["state", "province", "region"]) {
        return Some(PersonalField::State);
    }
    if has(&["zip", "postal", "postcode"]) {
        return Some(PersonalField::PostalCode);
    }
    if has(&["linkedin"]) {
        return Some(PersonalField::LinkedIn);
    }
    if has(&["website", "portfolio", "github", "personal site"]) {
        return Some(PersonalField::Website);
    }
    if has_word(&["headline"]) {
        return Some(PersonalField::Headline);
    }
    None
}
