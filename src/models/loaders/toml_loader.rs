use crate::error::AppError;
use crate::models::profile::Profile;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;

/// 读取任意 TOML 文件并反序列化
pub async fn load_toml<T: DeserializeOwned>(toml_file_path: &Path) -> Result<T> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let value: T = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(value)
}

/// 加载求职者档案并做一致性检查
pub async fn load_profile(profile_path: &Path) -> Result<Profile> {
    if !profile_path.exists() {
        return Err(AppError::file_not_found(profile_path.display().to_string()).into());
    }

    let profile: Profile = load_toml(profile_path).await?;
    profile
        .validate()
        .with_context(|| format!("档案校验失败: {}", profile_path.display()))?;

    tracing::info!(
        "成功加载档案: {} 个搜索目标, {} 个地点, {} 条自定义回答",
        profile.targets.len(),
        profile.locations.len(),
        profile.custom_answers.len()
    );

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::PacingMode;

    const SAMPLE: &str = r#"
locations = ["remote", "Berlin"]
cooldown_days = 14
pacing = "slow"

[[targets]]
name = "sales"
quota_limit = 2

[[targets]]
name = "account manager"
locations = ["Munich"]

[experience]
default = 2
Salesforce = 4

[checkboxes]
legally_authorized = true

[eeo]
gender = "Prefer not to say"

[[work_history]]
title = "Account Executive"
company = "Acme"
current = true
start = { month = 4, year = 2021 }
"#;

    #[tokio::test]
    async fn test_load_profile_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let profile = load_profile(&path).await.unwrap();
        assert_eq!(profile.targets.len(), 2);
        assert_eq!(profile.targets[0].quota_limit, Some(2));
        assert_eq!(profile.cooldown_days, 14);
        assert_eq!(profile.pacing, PacingMode::Slow);
        assert_eq!(profile.experience.years_for("salesforce"), 4);
        assert!(profile.checkboxes.legally_authorized);
        assert!(profile.work_history[0].current);
        assert_eq!(
            profile.locations_for(&profile.targets[1]),
            &["Munich".to_string()]
        );
    }

    #[tokio::test]
    async fn test_load_profile_requires_default_experience() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        let broken = SAMPLE.replace("default = 2\n", "");
        tokio::fs::write(&path, broken).await.unwrap();

        assert!(load_profile(&path).await.is_err());
    }
}
