use serde::{Deserialize, Serialize};

/// 向导中字段的控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// 单选（radio 组）
    SingleSelect,
    /// 下拉框
    Dropdown,
    /// 自由文本
    Text,
    /// 数字文本
    Numeric,
    /// 日期
    Date,
    /// 复选框
    Checkbox,
    /// 文件上传
    File,
}

impl ControlKind {
    /// 是否为"从选项中选一个"类控件
    pub fn is_choice(self) -> bool {
        matches!(self, ControlKind::SingleSelect | ControlKind::Dropdown)
    }
}

/// 一道申请问题（向导某一步中的单个字段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub kind: ControlKind,
    pub label: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Question {
    pub fn new(kind: ControlKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// 小写化后的标签，供关键字匹配使用
    pub fn normalized_label(&self) -> String {
        self.label.trim().to_lowercase()
    }
}

/// 驱动层暴露的字段句柄
///
/// `id` 是驱动内部的不透明标识，核心逻辑只用它回传给驱动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardField {
    pub id: String,
    pub question: Question,
    /// 页面上已有的值（预填内容），空串视为未填
    #[serde(default)]
    pub current_value: Option<String>,
}

impl WizardField {
    pub fn is_prefilled(&self) -> bool {
        self.current_value
            .as_deref()
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}

/// 写入字段的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// 文本/数字/日期输入
    Text(String),
    /// 按选项文本选择
    Choice(String),
    /// 复选框
    Check(bool),
    /// 上传文件
    File(String),
}

impl FieldValue {
    /// 用于日志和报告的展示文本
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Text(v) | FieldValue::Choice(v) | FieldValue::File(v) => v.clone(),
            FieldValue::Check(b) => b.to_string(),
        }
    }
}
