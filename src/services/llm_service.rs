//! LLM 服务 - 业务能力层
//!
//! 通过 OpenAI 兼容接口实现远程协作方：回答申请问题、评估职位适配度。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::services::classifier::ResponseType;
use crate::services::collaborator::{
    extract_json_object, AnswerRequest, AnswerResponse, Collaborator, CollaboratorError,
    FitRequest, FitResponse,
};

const ANSWER_SYSTEM_PROMPT: &str = "You fill in job application forms on behalf of a candidate. \
Answer truthfully from the candidate context, keep answers short, and never invent credentials. \
Reply with a single JSON object: {\"result\": <answer>, \"explanation\": <short reason>}.";

const FIT_SYSTEM_PROMPT: &str = "You screen job postings for a candidate. \
Decide whether the candidate should apply. \
Reply with a single JSON object: {\"result\": true|false, \"explanation\": <short reason>}.";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成单个问题的回答
/// - 调用 LLM API 判断职位是否值得申请
/// - 不关心向导流程，不做重试
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `max_tokens`: 最大输出长度
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        max_tokens: u32,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.2)
            .max_tokens(max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    /// 构建回答问题的用户消息
    fn build_answer_message(request: &AnswerRequest) -> String {
        let format_hint = match request.response_type {
            ResponseType::Text => "\"result\" must be a short plain-text answer.".to_string(),
            ResponseType::Numeric => "\"result\" must be a single integer.".to_string(),
            ResponseType::Choice => {
                let options = request
                    .options
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|(idx, text)| format!("  {}: {}", idx, text))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "\"result\" must be the integer index of exactly one option:\n{}",
                    options
                )
            }
        };

        format!(
            "Candidate context:\n{}\n\nApplication question:\n{}\n\n{}",
            request.context, request.question, format_hint
        )
    }

    fn build_fit_message(request: &FitRequest) -> String {
        format!(
            "Candidate context:\n{}\n\nJob title: {}\n\nJob description:\n{}",
            request.context, request.job_title, request.job_description
        )
    }
}

#[async_trait]
impl Collaborator for LlmService {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, CollaboratorError> {
        let message = Self::build_answer_message(request);
        let raw = self
            .send_to_llm(&message, Some(ANSWER_SYSTEM_PROMPT), request.max_tokens)
            .await
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;
        parse_answer_response(&raw)
    }

    async fn evaluate_fit(&self, request: &FitRequest) -> Result<FitResponse, CollaboratorError> {
        let message = Self::build_fit_message(request);
        let raw = self
            .send_to_llm(&message, Some(FIT_SYSTEM_PROMPT), 256)
            .await
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;
        let json = extract_json_object(&raw)
            .ok_or_else(|| CollaboratorError::BadResponse(raw.clone()))?;
        serde_json::from_str(json).map_err(|e| CollaboratorError::BadResponse(e.to_string()))
    }
}

/// 解析模型回复；没有 JSON 对象时把整段文字当作结果
fn parse_answer_response(raw: &str) -> Result<AnswerResponse, CollaboratorError> {
    if let Some(json) = extract_json_object(raw) {
        if let Ok(parsed) = serde_json::from_str::<AnswerResponse>(json) {
            return Ok(parsed);
        }
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CollaboratorError::BadResponse("空响应".to_string()));
    }
    Ok(AnswerResponse {
        result: serde_json::Value::String(trimmed.to_string()),
        explanation: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_response_json() {
        let parsed =
            parse_answer_response("```json\n{\"result\": 1, \"explanation\": \"fits\"}\n```")
                .unwrap();
        assert_eq!(parsed.result, serde_json::json!(1));
        assert_eq!(parsed.explanation.as_deref(), Some("fits"));
    }

    #[test]
    fn test_parse_answer_response_plain_text() {
        let parsed = parse_answer_response("  Five years  ").unwrap();
        assert_eq!(parsed.result, serde_json::json!("Five years"));
        assert!(parse_answer_response("   ").is_err());
    }

    #[test]
    fn test_choice_prompt_lists_indexed_options() {
        let request = AnswerRequest {
            context: "Sales rep".to_string(),
            question: "Preferred shift?".to_string(),
            response_type: ResponseType::Choice,
            options: Some(vec![(0, "Day".to_string()), (1, "Night".to_string())]),
            max_tokens: 64,
        };
        let message = LlmService::build_answer_message(&request);
        assert!(message.contains("  0: Day"));
        assert!(message.contains("  1: Night"));
    }

    /// 测试 LLM API 连接性
    #[tokio::test]
    #[ignore]
    async fn test_llm_answer_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = LlmService::new(&Config::from_env());
        let request = AnswerRequest {
            context: "Account executive with 4 years of SaaS sales.".to_string(),
            question: "How many years of B2B sales experience do you have?".to_string(),
            response_type: ResponseType::Numeric,
            options: None,
            max_tokens: 64,
        };

        let response = service.answer(&request).await.expect("LLM 调用失败");
        println!("LLM 响应: {:?}", response);
    }
}
