// OpenAI 兼容的 chat completions 客户端
// 每次调用至多贡献一条发现，失败不向上冒泡

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::response::parse_creative_finding;
use super::Augmenter;
use crate::scanner::Finding;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SYSTEM_PROMPT: &str = "You are a creative application-security reviewer. Examine the \
submitted source code and report exactly one non-obvious potential security issue. Respond with \
a single raw JSON object with the fields \"type\" (one of: critical, high, medium, low), \
\"title\", \"description\", \"line\" (optional 1-based line number) and \"suggestion\". Do not \
wrap the response in markdown or code fences.";

pub struct LlmAugmenter {
    endpoint: String,
    model: String,
    http_client: Client,
    timeout: Duration,
}

impl LlmAugmenter {
    pub fn new(endpoint: String, model: String) -> Self {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// 显式超时，绑死单次请求的最坏延迟
    pub fn with_timeout(endpoint: String, model: String, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            endpoint,
            model,
            http_client,
            timeout,
        }
    }

    pub fn model_info(&self) -> String {
        format!("{} @ {}", self.model, self.endpoint)
    }

    async fn generate(&self, source: &str) -> anyhow::Result<String> {
        let url = format!("{}/v1/chat/completions", self.endpoint);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: format!("Analyze this code:\n\n{}", source),
                },
            ],
            temperature: Some(0.7),
            stream: Some(false),
        };

        let start = Instant::now();

        let response = self.http_client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM service returned HTTP {}: {}", status, body);
        }

        let api_response: ChatResponse = response.json().await?;

        tracing::debug!(
            "LLM generation completed in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        api_response
            .choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .map(|message| message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No content in LLM response"))
    }
}

#[async_trait]
impl Augmenter for LlmAugmenter {
    fn name(&self) -> &str {
        "llm-augmenter"
    }

    async fn creative_finding(&self, source: &str) -> Option<Finding> {
        let raw = match self.generate(source).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Creative finding request failed (timeout {:?}): {}", self.timeout, e);
                return None;
            }
        };

        match parse_creative_finding(&raw) {
            Ok(finding) => {
                tracing::debug!("Creative finding accepted: {}", finding.title);
                Some(finding)
            }
            Err(e) => {
                tracing::warn!(
                    "Discarding creative finding: {} (raw: {})",
                    e,
                    raw.chars().take(200).collect::<String>()
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: Option<Message>,
}
