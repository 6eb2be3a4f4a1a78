//! LLM gateway: a stateless call to an OpenAI-compatible chat completions
//! endpoint. Provider failures are classified uniformly as
//! [`ChatError::Generation`]; an unrecognized model is rejected at
//! construction time with [`ChatError::Configuration`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::{AppConfig, ChatError};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Known model-name prefixes and the provider family they belong to.
/// Anything outside this registry is a deployment mistake and is rejected
/// at startup rather than surfacing as a confusing per-request failure.
const MODEL_REGISTRY: &[(&str, &str)] = &[
    ("gpt-", "openai"),
    ("o3", "openai"),
    ("o4", "openai"),
    ("gemini-", "google"),
    ("claude-", "anthropic"),
    ("llama", "local"),
    ("mistral", "local"),
    ("qwen", "local"),
];

fn provider_for(model: &str) -> Option<&'static str> {
    MODEL_REGISTRY
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, provider)| *provider)
}

#[derive(Clone, Debug)]
pub struct LlmGateway {
    client: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
}

impl LlmGateway {
    pub fn new(config: &AppConfig) -> Result<Self, ChatError> {
        let provider = provider_for(&config.llm_model).ok_or_else(|| {
            ChatError::Configuration(format!(
                "unsupported model '{}': no matching provider in the registry",
                config.llm_model
            ))
        })?;
        tracing::debug!(model = %config.llm_model, provider, "LLM gateway configured");

        Ok(Self {
            client: reqwest::Client::new(),
            api_hostname: config.llm_api_hostname.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
        })
    }

    /// Submit an ordered prompt sequence and return the assistant text.
    pub async fn generate(&self, history: &[Message]) -> Result<String, ChatError> {
        let payload = json!({
            "model": self.model,
            "messages": history,
        });
        let url = format!(
            "{}/v1/chat/completions",
            self.api_hostname.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(120))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChatError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Generation(format!(
                "provider returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ChatError::Generation(e.to_string()))?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ChatError::Generation(format!("malformed provider response: {body}"))
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(hostname: &str, model: &str) -> AppConfig {
        AppConfig {
            db_path: ":memory:".to_string(),
            llm_api_hostname: hostname.to_string(),
            llm_api_key: "test-key".to_string(),
            llm_model: model.to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            retrieval_k: 4,
        }
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::new(Role::User, "Hello world");
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"role":"user","content":"Hello world"}"#
        );
    }

    #[test]
    fn test_gateway_rejects_unknown_model() {
        let config = test_config("https://api.openai.com", "made-up-model-9000");
        let err = LlmGateway::new(&config).unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
    }

    #[test]
    fn test_gateway_accepts_registered_models() {
        for model in ["gpt-4.1-mini", "gemini-2.0-flash", "llama3.2", "claude-3-haiku"] {
            let config = test_config("https://api.openai.com", model);
            assert!(LlmGateway::new(&config).is_ok(), "rejected {model}");
        }
    }

    #[tokio::test]
    async fn test_generate_basic() {
        let mut server = mockito::Server::new_async().await;

        let response_body = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4.1-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello!"
                },
                "finish_reason": "stop"
            }]
        }"#;

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body)
            .create_async()
            .await;

        let gateway = LlmGateway::new(&test_config(&server.url(), "gpt-4.1-mini")).unwrap();
        let history = vec![Message::new(Role::User, "Hi")];
        let result = gateway.generate(&history).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_generate_classifies_error_status() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let gateway = LlmGateway::new(&test_config(&server.url(), "gpt-4.1-mini")).unwrap();
        let history = vec![Message::new(Role::User, "Hi")];
        let err = gateway.generate(&history).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ChatError::Generation(_)));
    }

    #[tokio::test]
    async fn test_generate_classifies_malformed_response() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let gateway = LlmGateway::new(&test_config(&server.url(), "gpt-4.1-mini")).unwrap();
        let history = vec![Message::new(Role::User, "Hi")];
        let err = gateway.generate(&history).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ChatError::Generation(_)));
    }
}
