use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompts::{ExtractionRequest, ScoringRequest};
use super::response::{parse_keywords, parse_score};
use super::{Oracle, OracleError, OracleScore};
use crate::types::keyword::Keyword;

/// Price per 1000 tokens, in USD, used only to estimate run cost.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TokenPricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl TokenPricing {
    /// `ORACLE_PROMPT_PRICE_PER_1K` / `ORACLE_COMPLETION_PRICE_PER_1K`; `None`
    /// when neither is set.
    pub fn from_env() -> Option<Self> {
        let price = |key: &str| {
            dotenv::var(key)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|p| p.is_finite() && *p >= 0.0)
        };
        let prompt = price("ORACLE_PROMPT_PRICE_PER_1K");
        let completion = price("ORACLE_COMPLETION_PRICE_PER_1K");
        if prompt.is_none() && completion.is_none() {
            return None;
        }

        Some(Self {
            prompt_per_1k: prompt.unwrap_or(0.0),
            completion_per_1k: completion.unwrap_or(0.0),
        })
    }
}

/// Estimated spend for a [`UsageSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenCost {
    pub prompt: f64,
    pub completion: f64,
}

impl TokenCost {
    pub fn total(&self) -> f64 {
        self.prompt + self.completion
    }
}

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub max_tokens: u32,
    pub pricing: Option<TokenPricing>,
}

impl OracleConfig {
    /// Read `ORACLE_*` variables, honoring a `.env` file.
    pub fn from_env() -> Self {
        let base_url = dotenv::var("ORACLE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:1234/v1".to_string());
        let model = dotenv::var("ORACLE_MODEL").unwrap_or_else(|_| "qwen/qwen3-8b".to_string());
        let api_key = dotenv::var("ORACLE_API_KEY").ok().filter(|k| !k.is_empty());
        let request_timeout = dotenv::var("ORACLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(120));

        Self {
            base_url,
            model,
            api_key,
            request_timeout,
            max_tokens: 2048,
            pricing: TokenPricing::from_env(),
        }
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Token usage accumulated over the lifetime of an [`HttpOracle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl UsageSnapshot {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    pub fn cost(&self, pricing: &TokenPricing) -> TokenCost {
        TokenCost {
            prompt: self.prompt_tokens as f64 / 1_000.0 * pricing.prompt_per_1k,
            completion: self.completion_tokens as f64 / 1_000.0 * pricing.completion_per_1k,
        }
    }
}

/// Oracle backed by a chat completions HTTP API.
pub struct HttpOracle {
    client: reqwest::Client,
    config: OracleConfig,
    requests: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| OracleError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            requests: AtomicU64::new(0),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn pricing(&self) -> Option<TokenPricing> {
        self.config.pricing
    }

    /// Estimated spend so far, when pricing is configured.
    pub fn estimated_cost(&self) -> Option<TokenCost> {
        self.config.pricing.map(|pricing| self.usage().cost(&pricing))
    }

    pub fn usage(&self) -> UsageSnapshot {
        UsageSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
        }
    }

    /// Single-turn, non-streaming completion. Temperature 0 keeps the model as
    /// repeatable as the backend allows.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            max_tokens: self.config.max_tokens,
        };

        let mut req = self.client.post(self.config.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        self.requests.fetch_add(1, Ordering::Relaxed);
        let resp = req.send().await.map_err(classify_transport)?;
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let text = resp.text().await.map_err(classify_transport)?;

        if let Some(err) = status_error(status, retry_after, &text) {
            return Err(err);
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| OracleError::Malformed(format!("chat response: {e}")))?;

        if let Some(usage) = &parsed.usage {
            self.prompt_tokens
                .fetch_add(usage.prompt_tokens, Ordering::Relaxed);
            self.completion_tokens
                .fetch_add(usage.completion_tokens, Ordering::Relaxed);
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Malformed("response has no choices".to_string()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(OracleError::Rejected("content filtered".to_string()));
        }

        let content = choice.message.content.unwrap_or_default();
        debug!(bytes = content.len(), "Oracle completion received");
        Ok(content)
    }
}

/// Error for a non-success HTTP status, `None` for 2xx/3xx.
fn status_error(
    status: reqwest::StatusCode,
    retry_after: Option<Duration>,
    text: &str,
) -> Option<OracleError> {
    match status.as_u16() {
        408 => Some(OracleError::Timeout),
        429 => Some(OracleError::RateLimited { retry_after }),
        401 | 403 => Some(OracleError::Unauthorized(format!("HTTP {status}"))),
        _ if status.is_server_error() => {
            Some(OracleError::Transport(format!("HTTP {status}: {text}")))
        }
        _ if status.is_client_error() => {
            Some(OracleError::Rejected(format!("HTTP {status}: {text}")))
        }
        _ => None,
    }
}

fn classify_transport(err: reqwest::Error) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::Transport(err.to_string())
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn extract_keywords(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<Keyword>, OracleError> {
        let content = self.complete(&request.prompt).await?;
        parse_keywords(&content)
    }

    async fn score(&self, request: &ScoringRequest) -> Result<OracleScore, OracleError> {
        let content = self.complete(&request.prompt).await?;
        parse_score(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> OracleConfig {
        OracleConfig {
            base_url: base_url.to_string(),
            model: "m".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(1),
            max_tokens: 16,
            pricing: None,
        }
    }

    #[test]
    fn status_mapping() {
        use reqwest::StatusCode;

        let err = |code: u16| status_error(StatusCode::from_u16(code).unwrap(), None, "body");

        assert!(matches!(err(408), Some(OracleError::Timeout)));
        assert!(err(408).unwrap().is_transient());
        assert!(matches!(err(429), Some(OracleError::RateLimited { .. })));
        assert!(matches!(err(503), Some(OracleError::Transport(_))));
        assert!(matches!(err(401), Some(OracleError::Unauthorized(_))));
        assert!(matches!(err(400), Some(OracleError::Rejected(_))));
        assert!(err(200).is_none());
    }

    #[test]
    fn cost_is_priced_per_thousand_tokens() {
        let usage = UsageSnapshot {
            requests: 2,
            prompt_tokens: 2_000,
            completion_tokens: 500,
        };
        let cost = usage.cost(&TokenPricing {
            prompt_per_1k: 0.003,
            completion_per_1k: 0.015,
        });
        assert!((cost.prompt - 0.006).abs() < 1e-12);
        assert!((cost.completion - 0.0075).abs() < 1e-12);
        assert!((cost.total() - 0.0135).abs() < 1e-12);
    }

    #[test]
    fn endpoint_resolution() {
        assert_eq!(
            config("http://h/v1/").endpoint(),
            "http://h/v1/chat/completions"
        );
        assert_eq!(config("http://h").endpoint(), "http://h/v1/chat/completions");
        assert_eq!(
            config("http://h/v1/chat/completions").endpoint(),
            "http://h/v1/chat/completions"
        );
    }

    #[test]
    fn chat_response_tolerates_null_content() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":null},"finish_reason":"stop"}],"usage":{"prompt_tokens":3,"completion_tokens":1}}"#,
        )
        .unwrap();
        assert!(parsed.choices[0].message.content.is_none());
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 3);
    }
}
