use std::time::Duration;

use prlens_core::{FileDiff, LlmConfig, PrLensError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::{self, ReviewContext};
use crate::schema::{self, Review};

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use prlens_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this PR".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use prlens_review::llm::Role;
///
/// assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes `{base_url}/chat/completions` and
/// supports the JSON-object response format: OpenAI, Ollama, vLLM, LiteLLM, etc.
///
/// # Examples
///
/// ```
/// use prlens_core::LlmConfig;
/// use prlens_review::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.model(), "gpt-4-turbo");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// A missing API key is not an error here; it is reported when a
    /// request is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`PrLensError::LlmApi`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, PrLensError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PrLensError::LlmApi(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion request in JSON-object mode and return the
    /// message content.
    ///
    /// # Errors
    ///
    /// - [`PrLensError::MissingCredentials`] if no API key is configured
    /// - [`PrLensError::UpstreamTimeout`] if the request times out
    /// - [`PrLensError::LlmApi`] on other HTTP or decoding failures
    /// - [`PrLensError::LlmEmptyResponse`] if the reply has no content
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, PrLensError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(PrLensError::MissingCredentials("LLM_API_KEY"))?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0.1,
            "response_format": { "type": "json_object" },
        });

        debug!(model = %self.config.model, %url, "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PrLensError::LlmApi(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(e)
            } else {
                PrLensError::LlmApi(format!("failed to parse response: {e}"))
            }
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(PrLensError::LlmEmptyResponse)
    }

    /// Ask the model for a review of `context` and validate the reply.
    ///
    /// `files` are the fetched diffs the context was built from; every
    /// citation in the reply must point at new-file lines of one of their
    /// patches. There is no retry: the first invalid reply is an error.
    ///
    /// # Errors
    ///
    /// Everything [`LlmClient::chat`] returns, plus
    /// [`PrLensError::LlmSchemaValidation`] if the reply is not a valid review.
    pub async fn review(
        &self,
        context: &ReviewContext,
        files: &[FileDiff],
    ) -> Result<Review, PrLensError> {
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: prompt::build_system_prompt(),
            },
            ChatMessage {
                role: Role::User,
                content: prompt::build_review_prompt(context)?,
            },
        ];

        let content = self.chat(messages).await?;
        let review = schema::parse_review(&content)?;
        schema::validate_citations(&review, files)?;
        Ok(review)
    }
}

fn transport_error(e: reqwest::Error) -> PrLensError {
    if e.is_timeout() {
        PrLensError::UpstreamTimeout(format!("LLM request: {e}"))
    } else {
        PrLensError::LlmApi(format!("request failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use prlens_core::{FileStatus, PrMetadata};
    use serde_json::json;

    use super::*;

    fn config_for(server: &mockito::Server) -> LlmConfig {
        LlmConfig {
            api_key: Some("sk-test".into()),
            base_url: format!("{}/v1", server.url()),
            model: "test-model".into(),
            timeout_secs: 5,
        }
    }

    fn files() -> Vec<FileDiff> {
        vec![
            FileDiff {
                filename: "src/lib.rs".into(),
                status: FileStatus::Modified,
                additions: 1,
                deletions: 0,
                patch: Some("@@ -1,2 +1,3 @@\n fn a() {}\n+fn b() {}\n fn c() {}".into()),
            },
            FileDiff {
                filename: "logo.png".into(),
                status: FileStatus::Added,
                additions: 0,
                deletions: 0,
                patch: None,
            },
        ]
    }

    fn context() -> ReviewContext {
        ReviewContext::from_metadata(&PrMetadata {
            title: "Add b".into(),
            body: String::new(),
            author: "dev".into(),
            files: files(),
        })
    }

    fn completion(content: serde_json::Value) -> String {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
        .to_string()
    }

    fn review_json(citation: &str) -> serde_json::Value {
        json!({
            "overview": "Adds function b",
            "key_changes": [{ "point": "new fn", "citations": [citation] }],
            "risk_ranked_files": [],
            "tests": [],
            "code_smells": [],
            "security_notes": []
        })
    }

    #[test]
    fn model_returns_config_model() {
        let config = LlmConfig {
            model: "gpt-4o-mini".into(),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_request() {
        let client = LlmClient::new(&LlmConfig::default()).unwrap();
        let err = client.review(&context(), &files()).await.unwrap_err();
        assert!(matches!(err, PrLensError::MissingCredentials("LLM_API_KEY")));
    }

    #[tokio::test]
    async fn review_sends_json_mode_request_and_validates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "test-model",
                "response_format": { "type": "json_object" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion(json!(review_json("[src/lib.rs:L2-L2]").to_string())))
            .create_async()
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let review = client.review(&context(), &files()).await.unwrap();
        assert_eq!(review.overview, "Adds function b");
        assert_eq!(review.key_changes[0].citations[0].path, "src/lib.rs");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn null_content_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion(serde_json::Value::Null))
            .create_async()
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let err = client.review(&context(), &files()).await.unwrap_err();
        assert!(matches!(err, PrLensError::LlmEmptyResponse));
    }

    #[tokio::test]
    async fn no_choices_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let err = client.chat(vec![]).await.unwrap_err();
        assert!(matches!(err, PrLensError::LlmEmptyResponse));
    }

    #[tokio::test]
    async fn wrong_enum_value_fails_validation() {
        let mut server = mockito::Server::new_async().await;
        let mut bad = review_json("[src/lib.rs:L2-L2]");
        bad["risk_ranked_files"] =
            json!([{ "file": "src/lib.rs", "risk": "critical", "why": "x", "citations": [] }]);
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion(json!(bad.to_string())))
            .create_async()
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let err = client.review(&context(), &files()).await.unwrap_err();
        assert!(matches!(err, PrLensError::LlmSchemaValidation(_)));
    }

    #[tokio::test]
    async fn citation_into_binary_file_fails_validation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion(json!(review_json("[logo.png:L1-L3]").to_string())))
            .create_async()
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let err = client.review(&context(), &files()).await.unwrap_err();
        assert!(matches!(err, PrLensError::LlmSchemaValidation(_)));
        assert!(err.to_string().contains("logo.png"));
    }

    #[tokio::test]
    async fn http_error_is_llm_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let err = client.chat(vec![]).await.unwrap_err();
        assert!(matches!(err, PrLensError::LlmApi(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn slow_endpoint_is_upstream_timeout() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body_from_request(|_| {
                std::thread::sleep(std::time::Duration::from_secs(3));
                completion(json!("{}")).into_bytes()
            })
            .create_async()
            .await;

        let config = LlmConfig {
            timeout_secs: 1,
            ..config_for(&server)
        };
        let client = LlmClient::new(&config).unwrap();
        let err = client.chat(vec![]).await.unwrap_err();
        assert!(matches!(err, PrLensError::UpstreamTimeout(_)), "got {err:?}");
    }
}
