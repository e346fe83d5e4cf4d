//! OpenAI-compatible chat completions client.
//!
//! Sends each prompt as a single user message to `<base_url>/chat/completions`
//! and returns the first choice's content.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use askdb_core::config::LlmConfig;

use crate::client::{CompletionClient, CompletionRequest};
use crate::error::{missing_api_key_error, parse_http_error, LlmError, LlmResult};

/// Chat completions client.
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Build a client from settings, reading the key from `api_key_env`.
    pub fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        Self::with_api_key(config, config.api_key())
    }

    pub fn with_api_key(config: &LlmConfig, api_key: Option<String>) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Other {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
            "temperature": request.temperature,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            LlmError::NetworkError {
                message: err.to_string(),
            }
        }
    }
}

fn parse_response(body_text: &str) -> LlmResult<String> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body_text).map_err(|e| LlmError::ParseError {
            message: format!("Failed to parse response: {}", e),
        })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai"))?;

        let body = self.build_request_body(&request);
        debug!(
            model = %self.model,
            temperature = request.temperature,
            prompt_chars = request.prompt.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        parse_response(&body_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    fn config_for(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    // ---- Request shaping ----

    #[test]
    fn test_endpoint_joins_base_url() {
        let client =
            OpenAiClient::with_api_key(&config_for("http://localhost:9999/v1/"), None).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9999/v1/chat/completions");
        assert!(!client.has_api_key());
    }

    #[test]
    fn test_request_body_shape() {
        let client = OpenAiClient::with_api_key(&config_for("http://x/v1"), None).unwrap();
        let body = client.build_request_body(&CompletionRequest::new("How many users?", 0.0));
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "How many users?");
        assert_eq!(body["temperature"], 0.0);
    }

    // ---- Response parsing ----

    #[test]
    fn test_parse_response_first_choice() {
        let text = r#"{"choices":[{"message":{"role":"assistant","content":"SELECT 1"}},{"message":{"content":"other"}}]}"#;
        assert_eq!(parse_response(text).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_parse_response_empty_or_missing_content() {
        assert_eq!(parse_response(r#"{"choices":[]}"#), Err(LlmError::EmptyResponse));
        assert_eq!(
            parse_response(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(LlmError::EmptyResponse)
        );
        assert_eq!(
            parse_response(r#"{"choices":[{"message":{"content":"  "}}]}"#),
            Err(LlmError::EmptyResponse)
        );
    }

    #[test]
    fn test_parse_response_garbage() {
        assert!(matches!(parse_response("<html>"), Err(LlmError::ParseError { .. })));
    }

    // ---- Over the wire ----

    #[tokio::test]
    async fn test_missing_key_fails_before_sending() {
        let client = OpenAiClient::with_api_key(&config_for("http://127.0.0.1:1/v1"), None).unwrap();
        let err = client
            .complete(CompletionRequest::new("hi", 0.6))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn test_complete_against_local_server() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
                Json(serde_json::json!({
                    "choices": [{ "message": { "content": format!("{} | {}", auth, prompt) } }]
                }))
            }),
        );
        let base = serve(router).await;
        let client =
            OpenAiClient::with_api_key(&config_for(&base), Some("sk-test".to_string())).unwrap();

        let text = client
            .complete(CompletionRequest::new("ping", 0.7))
            .await
            .unwrap();
        assert_eq!(text, "Bearer sk-test | ping");
    }

    #[tokio::test]
    async fn test_http_errors_are_classified() {
        let router = Router::new()
            .route(
                "/unauthorized/chat/completions",
                post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
            )
            .route(
                "/broken/chat/completions",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            );
        let base = serve(router).await;
        let root = base.trim_end_matches("/v1");

        let client = OpenAiClient::with_api_key(
            &config_for(&format!("{}/unauthorized", root)),
            Some("k".to_string()),
        )
        .unwrap();
        let err = client.complete(CompletionRequest::new("x", 0.0)).await.unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed { .. }));

        let client = OpenAiClient::with_api_key(
            &config_for(&format!("{}/broken", root)),
            Some("k".to_string()),
        )
        .unwrap();
        let err = client.complete(CompletionRequest::new("x", 0.0)).await.unwrap_err();
        assert_eq!(
            err,
            LlmError::ServerError {
                message: "upstream down".to_string(),
                status: 502
            }
        );
    }
}
