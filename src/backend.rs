//! Dialog backend client
//!
//! Turns conversation history into the next assistant utterance via an
//! OpenAI-compatible chat-completions endpoint. Failures never propagate to
//! the engine: every failure path resolves to a fixed fallback phrase so the
//! call always has something to say.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::locale::BackendFallbacks;
use crate::transcript::{Speaker, Utterance};
use crate::{Error, Result};

/// Request timeout for one completion round-trip
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Produces the next utterance for a conversation
#[async_trait]
pub trait DialogBackend: Send + Sync {
    /// Generate the next assistant utterance for the given history
    ///
    /// Implementations must not fail: error paths resolve to a speakable
    /// fallback phrase.
    async fn generate_reply(&self, system_prompt: &str, history: &[Utterance]) -> String;
}

/// How the API key is presented to the endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    #[default]
    Bearer,
    /// `Authorization: Api-Key <key>` (Yandex Cloud style)
    ApiKey,
}

/// Chat-completions request body
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

/// One message in a chat-completions request
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat-completions response body
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Why a round-trip produced no usable reply
#[derive(Debug, Clone, Copy)]
enum Failure {
    Network,
    Malformed,
    MissingReply,
}

/// HTTP client for an OpenAI-compatible completion endpoint
pub struct HttpDialogBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    auth_scheme: AuthScheme,
    model: String,
    max_tokens: u32,
    temperature: f32,
    fallbacks: BackendFallbacks,
}

impl HttpDialogBackend {
    /// Create a new backend client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be
    /// built.
    pub fn new(config: &LlmConfig, fallbacks: BackendFallbacks) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("LLM API key required".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Backend(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            auth_scheme: config.auth_scheme,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            fallbacks,
        })
    }

    /// Perform one completion round-trip
    async fn request_reply(&self, system_prompt: &str, history: &[Utterance]) -> std::result::Result<String, Failure> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: system_prompt,
        }];
        messages.extend(history.iter().map(|u| ChatMessage {
            role: match u.speaker {
                Speaker::User => "user",
                Speaker::Assistant => "assistant",
            },
            content: &u.text,
        }));

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let authorization = match self.auth_scheme {
            AuthScheme::Bearer => format!("Bearer {}", self.api_key),
            AuthScheme::ApiKey => format!("Api-Key {}", self.api_key),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", authorization)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "completion request failed");
                Failure::Network
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "completion API error");
            return Err(Failure::Network);
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse completion response");
            Failure::Malformed
        })?;

        body.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|text| !text.trim().is_empty())
            .ok_or(Failure::MissingReply)
    }

    /// Pick the fallback phrase for a failure kind
    fn fallback_for(&self, failure: Failure) -> String {
        match failure {
            Failure::Network => self.fallbacks.network.clone(),
            Failure::Malformed => self.fallbacks.malformed.clone(),
            Failure::MissingReply => self.fallbacks.missing_reply.clone(),
        }
    }
}

#[async_trait]
impl DialogBackend for HttpDialogBackend {
    async fn generate_reply(&self, system_prompt: &str, history: &[Utterance]) -> String {
        match self.request_reply(system_prompt, history).await {
            Ok(text) => {
                tracing::debug!(chars = text.len(), "completion received");
                text
            }
            Err(failure) => {
                tracing::warn!(?failure, "substituting fallback phrase");
                self.fallback_for(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocalePack;

    fn test_config(endpoint: &str) -> LlmConfig {
        LlmConfig {
            endpoint: endpoint.to_string(),
            api_key: Some("test-key".to_string()),
            auth_scheme: AuthScheme::Bearer,
            model: "test-model".to_string(),
            max_tokens: 80,
            temperature: 0.3,
        }
    }

    fn fallbacks() -> BackendFallbacks {
        LocalePack::load("en").unwrap().messages.backend_fallbacks
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let mut config = test_config("http://localhost:9");
        config.api_key = None;
        assert!(HttpDialogBackend::new(&config, fallbacks()).is_err());

        config.api_key = Some(String::new());
        assert!(HttpDialogBackend::new(&config, fallbacks()).is_err());
    }

    #[test]
    fn request_body_shape_is_openai_compatible() {
        let request = ChatRequest {
            model: "test-model",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "be brief",
                },
                ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            max_tokens: 80,
            temperature: 0.3,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_tokens"], 80);
    }

    #[test]
    fn response_without_choices_parses() {
        let body: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(body.choices.is_empty());

        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"hi"}}]}"#).unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_network_fallback() {
        // Port 9 (discard) is closed on any sane test machine
        let backend =
            HttpDialogBackend::new(&test_config("http://127.0.0.1:9/v1/chat/completions"), fallbacks())
                .unwrap();

        let reply = backend
            .generate_reply("be brief", &[Utterance::user("hello")])
            .await;
        assert_eq!(reply, fallbacks().network);
    }

    #[test]
    fn auth_scheme_deserializes_from_kebab_case() {
        assert_eq!(
            serde_json::from_str::<AuthScheme>("\"api-key\"").unwrap(),
            AuthScheme::ApiKey
        );
        assert_eq!(
            serde_json::from_str::<AuthScheme>("\"bearer\"").unwrap(),
            AuthScheme::Bearer
        );
    }
}
