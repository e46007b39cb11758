//! 未准备问题记录 - 业务能力层
//!
//! 把档案里没有现成答案的问题追加到文本文件，便于之后补充档案

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::models::{FieldValue, Question};

/// 未准备问题记录
///
/// 职责：
/// - 只负责追加单条记录
/// - 不关心回答来自哪个策略
pub struct UnpreparedWriter {
    file_path: Option<PathBuf>,
}

impl UnpreparedWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
        }
    }

    /// 不落盘（测试或关闭记录时使用）
    pub fn disabled() -> Self {
        Self { file_path: None }
    }

    /// 写入一条记录
    ///
    /// # 参数
    /// - `question`: 问题
    /// - `answer`: 最终填写的值
    /// - `source`: 回答来源（用于调优）
    pub fn write(&self, question: &Question, answer: &FieldValue, source: &str) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        debug!(
            "记录未准备问题: {} | 来源: {}",
            question.label, source
        );

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        let options = if question.options.is_empty() {
            "-".to_string()
        } else {
            question.options.join(" / ")
        };
        let line = format!(
            "{} | {:?} | {} | 选项: {} | 回答: {} | 来源: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            question.kind,
            question.label.replace('\n', " "),
            options,
            answer.display_text(),
            source
        );

        file.write_all(line.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ControlKind;

    #[test]
    fn test_write_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unprepared.txt");
        let writer = UnpreparedWriter::with_path(&path);

        let question = Question::new(ControlKind::Dropdown, "Preferred shift?")
            .with_options(["Day", "Night"]);
        writer
            .write(&question, &FieldValue::Choice("Night".to_string()), "safe_default")
            .unwrap();
        writer
            .write(&question, &FieldValue::Choice("Day".to_string()), "collaborator")
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Preferred shift? | 选项: Day / Night | 回答: Night"));
        assert!(lines[1].ends_with("来源: collaborator"));
    }
}
