//! 申请结果报告 - 业务能力层
//!
//! 以 CSV 形式追加成功和失败的申请记录

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::models::JobSummary;

#[derive(Debug, Serialize)]
struct AppliedRow<'a> {
    applied_at: String,
    target: &'a str,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct FailedRow<'a> {
    failed_at: String,
    target: &'a str,
    title: &'a str,
    company: &'a str,
    url: &'a str,
    reason: &'a str,
}

/// 报告写入器
pub struct ReportWriter {
    applied_path: Option<PathBuf>,
    failed_path: Option<PathBuf>,
}

impl ReportWriter {
    pub fn new(applied_path: impl Into<PathBuf>, failed_path: impl Into<PathBuf>) -> Self {
        Self {
            applied_path: Some(applied_path.into()),
            failed_path: Some(failed_path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            applied_path: None,
            failed_path: None,
        }
    }

    pub fn record_applied(&self, target: &str, job: &JobSummary) -> Result<()> {
        let Some(path) = &self.applied_path else {
            return Ok(());
        };
        append_row(
            path,
            &AppliedRow {
                applied_at: now(),
                target,
                title: &job.title,
                company: &job.company,
                location: &job.location,
                url: &job.url,
            },
        )
    }

    pub fn record_failed(&self, target: &str, job: &JobSummary, reason: &str) -> Result<()> {
        let Some(path) = &self.failed_path else {
            return Ok(());
        };
        append_row(
            path,
            &FailedRow {
                failed_at: now(),
                target,
                title: &job.title,
                company: &job.company,
                url: &job.url,
                reason,
            },
        )
    }
}

fn now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 追加一行，新文件先写表头
fn append_row<T: Serialize>(path: &Path, row: &T) -> Result<()> {
    let needs_header = !path.exists()
        || std::fs::metadata(path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("无法打开报告文件: {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(row)?;
    writer.flush()?;
    Ok(())
}
