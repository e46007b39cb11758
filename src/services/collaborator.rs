//! 远程协作方接口 - 业务能力层
//!
//! 回答生成和适配度评估都由外部文本生成服务完成，这里只定义请求/响应格式
//! 和调用接口，具体传输见 `llm_service`（OpenAI 兼容接口）和
//! `http_collaborator`（JSON 端点）。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::services::classifier::ResponseType;

/// 回答生成请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub context: String,
    pub question: String,
    pub response_type: ResponseType,
    /// `[index, text]` 对，仅 choice 类型携带
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<(usize, String)>>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub result: JsonValue,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// 适配度评估请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitRequest {
    pub context: String,
    pub job_title: String,
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitResponse {
    pub result: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// 协作方调用失败；调用方只降级，不向上抛
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("协作方请求失败: {0}")]
    Request(String),
    #[error("协作方请求超时 ({0} 秒)")]
    Timeout(u64),
    #[error("协作方返回无法解析的内容: {0}")]
    BadResponse(String),
    #[error("协作方返回的选项索引 {index} 超出范围 [0, {len})")]
    IndexOutOfRange { index: i64, len: usize },
}

/// 远程协作方
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, CollaboratorError>;

    async fn evaluate_fit(&self, request: &FitRequest) -> Result<FitResponse, CollaboratorError>;
}

/// 从模型输出中取出 JSON 对象（容忍 ```json 代码块和前后多余文字）
pub(crate) fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
