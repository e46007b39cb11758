//! 可重复分组（工作经历 / 教育经历）的填写

use anyhow::Result;
use tracing::{debug, warn};

use crate::infrastructure::BoardDriver;
use crate::models::{ControlKind, EducationEntry, FieldValue, MonthYear, WizardField, WorkEntry};

const TITLE_KEYS: &[&str] = &["title", "position", "role"];
const COMPANY_KEYS: &[&str] = &["company", "employer", "organization"];
const CITY_KEYS: &[&str] = &["city", "location"];
const DESCRIPTION_KEYS: &[&str] = &["description", "responsibilit", "summary"];
const SCHOOL_KEYS: &[&str] = &["school", "university", "college", "institution"];
const DEGREE_KEYS: &[&str] = &["degree", "qualification"];
const MAJOR_KEYS: &[&str] = &["major", "field of study", "discipline"];

/// 分组中的一条记录，抽象掉工作 / 教育的差异
#[derive(Debug, Clone)]
pub struct GroupEntry {
    /// (标签关键字, 值)，按顺序匹配，先命中者胜
    pub texts: Vec<(&'static [&'static str], String)>,
    pub current: bool,
    pub start: MonthYear,
    pub end: Option<MonthYear>,
}

impl From<&WorkEntry> for GroupEntry {
    fn from(entry: &WorkEntry) -> Self {
        Self {
            texts: vec![
                (TITLE_KEYS, entry.title.clone()),
                (COMPANY_KEYS, entry.company.clone()),
                (CITY_KEYS, entry.city.clone()),
                (DESCRIPTION_KEYS, entry.description.clone()),
            ],
            current: entry.current,
            start: entry.start,
            end: entry.end,
        }
    }
}

impl From<&EducationEntry> for GroupEntry {
    fn from(entry: &EducationEntry) -> Self {
        Self {
            texts: vec![
                (SCHOOL_KEYS, entry.school.clone()),
                (DEGREE_KEYS, entry.degree.clone()),
                (MAJOR_KEYS, entry.major.clone()),
                (CITY_KEYS, entry.city.clone()),
            ],
            current: entry.current,
            start: entry.start,
            end: entry.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePart {
    Month,
    Year,
    Full,
}

fn date_side(label: &str) -> Option<Side> {
    let words: Vec<&str> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.iter().any(|w| matches!(*w, "start" | "from" | "began" | "started")) {
        Some(Side::Start)
    } else if words.iter().any(|w| matches!(*w, "end" | "to" | "until" | "ended" | "graduation")) {
        Some(Side::End)
    } else {
        None
    }
}

fn date_part(field: &WizardField, label: &str) -> Option<DatePart> {
    if label.contains("month") {
        Some(DatePart::Month)
    } else if label.contains("year") {
        Some(DatePart::Year)
    } else if field.question.kind == ControlKind::Date || label.contains("date") {
        Some(DatePart::Full)
    } else {
        None
    }
}

fn date_value(field: &WizardField, date: &MonthYear, part: DatePart) -> FieldValue {
    let text = match part {
        DatePart::Month => date.month_name().to_string(),
        DatePart::Year => date.year.to_string(),
        DatePart::Full => format!("{:02}/{}", date.month, date.year),
    };
    if field.question.kind.is_choice() {
        let options = &field.question.options;
        let wanted = text.to_lowercase();
        let chosen = options
            .iter()
            .find(|o| o.trim().to_lowercase() == wanted)
            .or_else(|| options.iter().find(|o| is_abbreviation(o, &wanted)))
            .cloned()
            .unwrap_or(text);
        FieldValue::Choice(chosen)
    } else {
        FieldValue::Text(text)
    }
}

/// "Mar" 对 "march"、"Sept" 对 "september"，以及反过来的 "March 2019" 对 "march"
fn is_abbreviation(option: &str, wanted: &str) -> bool {
    let option = option.trim().to_lowercase();
    option.chars().count() >= 3 && (wanted.starts_with(&option) || option.starts_with(wanted))
}

/// 计算一条记录中每个字段要写入的值；不在结果里的字段保持原样
pub fn plan_entry(fields: &[WizardField], entry: &GroupEntry) -> Vec<(String, FieldValue)> {
    let mut plan = Vec::new();
    // 标签里没写起止的日期字段按出现顺序分配：先起后止
    let mut unlabelled_seen = [0usize; 3];

    for field in fields {
        let label = field.question.normalized_label();

        if field.question.kind == ControlKind::Checkbox {
            if label.contains("current") {
                plan.push((field.id.clone(), FieldValue::Check(entry.current)));
            }
            continue;
        }

        if let Some(part) = date_part(field, &label) {
            let side = date_side(&label).unwrap_or_else(|| {
                let slot = match part {
                    DatePart::Month => 0,
                    DatePart::Year => 1,
                    DatePart::Full => 2,
                };
                unlabelled_seen[slot] += 1;
                if unlabelled_seen[slot] == 1 {
                    Side::Start
                } else {
                    Side::End
                }
            });
            match side {
                Side::Start => plan.push((field.id.clone(), date_value(field, &entry.start, part))),
                Side::End if entry.current => {}
                Side::End => {
                    if let Some(end) = &entry.end {
                        plan.push((field.id.clone(), date_value(field, end, part)));
                    }
                }
            }
            continue;
        }

        if let Some((_, value)) = entry
            .texts
            .iter()
            .find(|(keywords, value)| !value.is_empty() && keywords.iter().any(|k| label.contains(k)))
        {
            let value = if field.question.kind.is_choice() {
                FieldValue::Choice(value.clone())
            } else {
                FieldValue::Text(value.clone())
            };
            plan.push((field.id.clone(), value));
        }
    }

    plan
}

/// 填写整个分组：先清空已有条目，再逐条添加
pub async fn fill_group(driver: &dyn BoardDriver, entries: &[GroupEntry]) -> Result<()> {
    if entries.is_empty() {
        debug!("档案中没有该分组的记录，保持页面原样");
        return Ok(());
    }

    let removed = driver.clear_group_entries().await?;
    if removed > 0 {
        debug!("已删除 {} 条预填记录", removed);
    }

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            driver.add_group_entry().await?;
        }
        let fields = driver.group_fields(i).await?;
        for (field_id, value) in plan_entry(&fields, entry) {
            if let Err(e) = driver.fill_field(&field_id, &value).await {
                warn!("⚠️ 分组第 {} 条字段填写失败: {}", i + 1, e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Question;

    fn field(id: &str, kind: ControlKind, label: &str) -> WizardField {
        WizardField {
            id: id.to_string(),
            question: Question::new(kind, label),
            current_value: None,
        }
    }

    fn work(current: bool) -> WorkEntry {
        WorkEntry {
            title: "Account Executive".to_string(),
            company: "Initech".to_string(),
            city: "Austin".to_string(),
            description: "Closed deals".to_string(),
            current,
            start: MonthYear { month: 3, year: 2019 },
            end: Some(MonthYear { month: 8, year: 2022 }),
        }
    }

    fn fields() -> Vec<WizardField> {
        vec![
            field("1", ControlKind::Text, "Your title"),
            field("2", ControlKind::Text, "Company"),
            field("3", ControlKind::Checkbox, "I currently work here"),
            field("4", ControlKind::Text, "From month"),
            field("5", ControlKind::Text, "From year"),
            field("6", ControlKind::Text, "To month"),
            field("7", ControlKind::Text, "To year"),
            field("8", ControlKind::Text, "City"),
        ]
    }

    #[test]
    fn test_plan_past_entry() {
        let plan = plan_entry(&fields(), &GroupEntry::from(&work(false)));
        let value = |id: &str| plan.iter().find(|(f, _)| f == id).map(|(_, v)| v.clone());

        assert_eq!(value("1"), Some(FieldValue::Text("Account Executive".to_string())));
        assert_eq!(value("2"), Some(FieldValue::Text("Initech".to_string())));
        assert_eq!(value("3"), Some(FieldValue::Check(false)));
        assert_eq!(value("4"), Some(FieldValue::Text("March".to_string())));
        assert_eq!(value("5"), Some(FieldValue::Text("2019".to_string())));
        assert_eq!(value("6"), Some(FieldValue::Text("August".to_string())));
        assert_eq!(value("7"), Some(FieldValue::Text("2022".to_string())));
        assert_eq!(value("8"), Some(FieldValue::Text("Austin".to_string())));
    }

    #[test]
    fn test_current_entry_leaves_end_untouched() {
        let plan = plan_entry(&fields(), &GroupEntry::from(&work(true)));
        let ids: Vec<&str> = plan.iter().map(|(id, _)| id.as_str()).collect();

        assert!(ids.contains(&"3"));
        assert!(!ids.contains(&"6"));
        assert!(!ids.contains(&"7"));
        assert!(plan.contains(&("3".to_string(), FieldValue::Check(true))));
    }

    #[test]
    fn test_unlabelled_dropdown_dates_use_order() {
        let months: Vec<String> = ["January", "February", "March", "August"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut start = field("a", ControlKind::Dropdown, "Month");
        start.question.options = months.clone();
        let mut end = field("b", ControlKind::Dropdown, "Month");
        end.question.options = months;

        let plan = plan_entry(&[start, end], &GroupEntry::from(&work(false)));
        assert_eq!(
            plan,
            vec![
                ("a".to_string(), FieldValue::Choice("March".to_string())),
                ("b".to_string(), FieldValue::Choice("August".to_string())),
            ]
        );
    }

    #[test]
    fn test_education_keywords() {
        let entry = EducationEntry {
            school: "State University".to_string(),
            degree: "BA".to_string(),
            major: "Economics".to_string(),
            city: "Dallas".to_string(),
            current: false,
            start: MonthYear { month: 9, year: 2012 },
            end: Some(MonthYear { month: 5, year: 2016 }),
        };
        let plan = plan_entry(
            &[
                field("s", ControlKind::Text, "School"),
                field("d", ControlKind::Text, "Degree"),
                field("m", ControlKind::Text, "Major / Field of study"),
            ],
            &GroupEntry::from(&entry),
        );
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[2].1, FieldValue::Text("Economics".to_string()));
    }

    #[test]
    fn test_abbreviated_month_options() {
        let months: Vec<String> = ["Jan", "Feb", "Mar", "Aug", "Sept"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut start = field("a", ControlKind::Dropdown, "Start month");
        start.question.options = months.clone();
        let mut end = field("b", ControlKind::Dropdown, "End month");
        end.question.options = months.clone();

        let plan = plan_entry(&[start, end], &GroupEntry::from(&work(false)));
        assert_eq!(
            plan,
            vec![
                ("a".to_string(), FieldValue::Choice("Mar".to_string())),
                ("b".to_string(), FieldValue::Choice("Aug".to_string())),
            ]
        );

        let mut september = work(false);
        september.start = MonthYear { month: 9, year: 2020 };
        let mut only_start = field("c", ControlKind::Dropdown, "Start month");
        only_start.question.options = months;
        let plan = plan_entry(&[only_start], &GroupEntry::from(&september));
        assert_eq!(plan[0].1, FieldValue::Choice("Sept".to_string()));
    }
}
