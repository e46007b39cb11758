//! HTTP 协作方 - 业务能力层
//!
//! 直接以 JSON 格式调用外部文本生成服务：
//! - `POST {base}/answer`：`AnswerRequest` → `AnswerResponse`
//! - `POST {base}/fit`：`FitRequest` → `FitResponse`

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::services::collaborator::{
    AnswerRequest, AnswerResponse, Collaborator, CollaboratorError, FitRequest, FitResponse,
};

pub struct HttpCollaborator {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpCollaborator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, CollaboratorError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let endpoint = format!("{}/{}", self.base_url, path);
        debug!("调用协作方: {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout(self.timeout_secs)
                } else {
                    CollaboratorError::Request(format!("{}: {}", endpoint, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("协作方返回错误状态 {} ({})", status, endpoint);
            return Err(CollaboratorError::Request(format!(
                "{} 返回状态 {}",
                endpoint, status
            )));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| CollaboratorError::BadResponse(e.to_string()))
    }
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, CollaboratorError> {
        self.post("answer", request).await
    }

    async fn evaluate_fit(&self, request: &FitRequest) -> Result<FitResponse, CollaboratorError> {
        self.post("fit", request).await
    }
}
