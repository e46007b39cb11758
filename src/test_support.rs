//! 单元测试共用的样例数据

use crate::models::{JobSummary, Profile};

pub const PROFILE_TOML: &str = r#"
locations = ["remote"]
cooldown_days = 30

[[targets]]
name = "sales"
quota_limit = 2

[personal]
first_name = "Alex"
last_name = "Morgan"
email = "alex.morgan@example.com"
phone = "5550100"
city = "Austin"
country = "United States"

[checkboxes]
legally_authorized = true
requires_visa_sponsorship = false
willing_to_commute = true
background_check = true

[experience]
default = 2
Salesforce = 4

[languages]
German = "Professional"
"#;

pub fn profile() -> Profile {
    toml::from_str(PROFILE_TOML).expect("valid sample profile")
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
