//! 申请台账 - 业务能力层
//!
//! 记录已申请职位的 URL 和申请时间，用于跨运行去重和冷却期判断。
//!
//! 文件格式：`[{ "url": "...", "applied_date": "2025-01-01T08:00:00Z" }, ...]`
//! 旧格式（纯 URL 数组）在加载时自动迁移并立即写回。

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::normalize_url;

/// 台账中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub url: String,
    #[serde(deserialize_with = "deserialize_applied_date")]
    pub applied_date: DateTime<Utc>,
}

/// 兼容带时区和不带时区两种写法，不带时区的按 UTC 处理
fn deserialize_applied_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("无法解析申请时间 '{}': {}", raw, e)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LedgerFile {
    Current(Vec<ApplicationRecord>),
    Legacy(Vec<String>),
}

/// 申请台账
///
/// 职责：
/// - 判断某个职位是否在冷却期内已申请过
/// - 每次新增记录后立即同步落盘
/// - 不关心搜索和向导流程
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    records: HashMap<String, DateTime<Utc>>,
}

impl Ledger {
    /// 打开台账文件（不存在时视为空台账）
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        Self::load_at(path, Utc::now())
    }

    /// 同 `load`，迁移旧格式时使用给定的时间
    pub fn load_at(path: impl Into<PathBuf>, now: DateTime<Utc>) -> Result<Self> {
        let path = path.into();
        let mut ledger = Self {
            path,
            records: HashMap::new(),
        };

        if !ledger.path.exists() {
            info!("台账文件不存在，将新建: {}", ledger.path.display());
            return Ok(ledger);
        }

        let content = fs::read_to_string(&ledger.path)
            .with_context(|| format!("无法读取台账文件: {}", ledger.path.display()))?;
        if content.trim().is_empty() {
            return Ok(ledger);
        }

        let parsed: LedgerFile = serde_json::from_str(&content)
            .map_err(|e| AppError::corrupt_ledger(ledger.path.display().to_string(), e))?;

        match parsed {
            LedgerFile::Current(records) => {
                for record in records {
                    ledger.insert(&record.url, record.applied_date);
                }
                debug!("台账加载完成: {} 条记录", ledger.len());
            }
            LedgerFile::Legacy(urls) => {
                warn!(
                    "检测到旧格式台账 ({} 条)，迁移为带时间戳的格式",
                    urls.len()
                );
                for url in urls {
                    ledger.insert(&url, now);
                }
                ledger.save()?;
                info!("✓ 台账迁移完成并已写回: {}", ledger.path.display());
            }
        }

        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 冷却期内是否已申请过
    pub fn has(&self, url: &str, cooldown_days: u32) -> bool {
        self.has_at(url, cooldown_days, Utc::now())
    }

    pub fn has_at(&self, url: &str, cooldown_days: u32, now: DateTime<Utc>) -> bool {
        match self.records.get(&normalize_url(url)) {
            Some(applied_at) => now - *applied_at < Duration::days(i64::from(cooldown_days)),
            None => false,
        }
    }

    pub fn applied_at(&self, url: &str) -> Option<DateTime<Utc>> {
        self.records.get(&normalize_url(url)).copied()
    }

    /// 记录一次成功申请并立即落盘
    pub fn add(&mut self, url: &str) -> Result<()> {
        self.add_at(url, Utc::now())
    }

    pub fn add_at(&mut self, url: &str, now: DateTime<Utc>) -> Result<()> {
        self.insert(url, now);
        self.save()
    }

    fn insert(&mut self, url: &str, at: DateTime<Utc>) {
        self.records.insert(normalize_url(url), at);
    }

    /// 同步写盘：先写临时文件再改名
    pub fn save(&self) -> Result<()> {
        let mut records: Vec<ApplicationRecord> = self
            .records
            .iter()
            .map(|(url, at)| ApplicationRecord {
                url: url.clone(),
                applied_date: *at,
            })
            .collect();
        records.sort_by(|a, b| a.applied_date.cmp(&b.applied_date).then(a.url.cmp(&b.url)));

        let json = serde_json::to_string_pretty(&records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("无法创建目录: {}", parent.display()))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("无法写入台账临时文件: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;

        debug!("台账已保存: {} 条记录", records.len());
        Ok(())
    }
}
