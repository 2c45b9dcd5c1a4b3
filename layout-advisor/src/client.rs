//! HTTP client for OpenAI-compatible chat-completions endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use layout_core::{SourceText, SuggestionOutcome, SuggestionRequest};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::prompt::{tidy_response, user_prompt, SYSTEM_PROMPT};
use crate::SuggestionService;

const COMPLETIONS_PATH: &str = "/chat/completions";
const MAX_ERROR_BODY: usize = 512;

/// Suggestion service backed by a chat-completions API.
#[derive(Clone)]
pub struct ChatCompletionsAdvisor {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ChatCompletionsAdvisor {
    /// Create a client from configuration.
    ///
    /// `base_url` may be an API base (`https://host/v1`) or the completions
    /// endpoint itself.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::MissingCredential`] if no key is configured.
    /// Returns [`AdvisorError::InvalidUrl`] if the URL is malformed.
    /// Returns [`AdvisorError::Http`] if the HTTP client fails to build.
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(AdvisorError::MissingCredential)?;
        let endpoint = completions_endpoint(&config.base_url)?;

        let http = Client::builder()
            .user_agent(concat!("layout-advisor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                endpoint,
                api_key,
                model: config.model.clone(),
                max_tokens: config.max_tokens,
            }),
        })
    }

    /// The resolved completions endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Ask the service for a relative-layout rewrite of `request.source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the credential is rejected,
    /// the payload is malformed or the completion is empty.
    pub async fn complete(&self, request: &SuggestionRequest) -> Result<SourceText, AdvisorError> {
        let body = ChatRequest {
            model: &self.inner.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(request),
                },
            ],
            max_tokens: self.inner.max_tokens,
        };

        debug!(
            generation = %request.generation,
            endpoint = %self.inner.endpoint,
            "requesting layout rewrite"
        );

        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .bearer_auth(&self.inner.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AdvisorError::Unauthorized(status.as_u16()));
        }
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .and_then(|content| tidy_response(&content))
            .ok_or(AdvisorError::EmptyResponse)
    }
}

#[async_trait]
impl SuggestionService for ChatCompletionsAdvisor {
    async fn rewrite(&self, request: &SuggestionRequest) -> SuggestionOutcome {
        match self.complete(request).await {
            Ok(text) => SuggestionOutcome::Rewritten(text),
            Err(err) => {
                warn!(generation = %request.generation, error = %err, "layout suggestion unavailable");
                SuggestionOutcome::Unavailable(err.into())
            }
        }
    }
}

fn completions_endpoint(base_url: &str) -> Result<Url, AdvisorError> {
    let mut url = Url::parse(base_url).map_err(|e| AdvisorError::InvalidUrl(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(AdvisorError::InvalidUrl(format!(
            "{base_url} cannot be used as an API base"
        )));
    }
    if !url.path().ends_with(COMPLETIONS_PATH) {
        let path = format!("{}{COMPLETIONS_PATH}", url.path().trim_end_matches('/'));
        url.set_path(&path);
    }
    Ok(url)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout_core::{Generation, Transform, UnavailableReason};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> SuggestionRequest {
        SuggestionRequest {
            generation: Generation::new(1),
            source: SourceText::default_component(),
            transform: Transform::new(300, 150, 10, 20),
        }
    }

    fn advisor_for(server: &MockServer) -> ChatCompletionsAdvisor {
        let config = AdvisorConfig {
            base_url: server.uri(),
            ..AdvisorConfig::with_api_key("sk-test")
        };
        ChatCompletionsAdvisor::new(&config).expect("client")
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn test_missing_credential() {
        let result = ChatCompletionsAdvisor::new(&AdvisorConfig::default());
        assert!(matches!(result, Err(AdvisorError::MissingCredential)));
    }

    #[test]
    fn test_invalid_url_error() {
        let config = AdvisorConfig {
            base_url: "not-a-valid-url".into(),
            ..AdvisorConfig::with_api_key("sk-test")
        };
        match ChatCompletionsAdvisor::new(&config) {
            Err(AdvisorError::InvalidUrl(_)) => {}
            Err(other) => panic!("Expected InvalidUrl error, got: {other:?}"),
            Ok(_) => panic!("Expected InvalidUrl error, got a client"),
        }
    }

    #[test]
    fn test_endpoint_resolution() {
        let api = completions_endpoint("https://api.openai.com/v1").expect("url");
        assert_eq!(api.as_str(), "https://api.openai.com/v1/chat/completions");

        let trailing = completions_endpoint("https://api.openai.com/v1/").expect("url");
        assert_eq!(trailing.as_str(), "https://api.openai.com/v1/chat/completions");

        let full = completions_endpoint("http://localhost:8080/chat/completions").expect("url");
        assert_eq!(full.as_str(), "http://localhost:8080/chat/completions");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééé", 3), "é…");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn rewrite_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 500
            })))
            .and(body_string_contains("New dimensions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "```jsx\nconst MyComponent = () => <div className=\"flex\" />;\n```",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let advisor = advisor_for(&server);
        let outcome = advisor.rewrite(&sample_request()).await;
        assert_eq!(
            outcome,
            SuggestionOutcome::Rewritten(SourceText::from(
                "const MyComponent = () => <div className=\"flex\" />;\n"
            ))
        );
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn rewrite_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let outcome = advisor_for(&server).rewrite(&sample_request()).await;
        assert_eq!(
            outcome,
            SuggestionOutcome::Unavailable(UnavailableReason::Unauthorized(401))
        );
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn rewrite_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = advisor_for(&server)
            .complete(&sample_request())
            .await
            .expect_err("should fail");
        match err {
            AdvisorError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("Expected Status error, got: {other:?}"),
        }
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn rewrite_empty_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
            .mount(&server)
            .await;

        let outcome = advisor_for(&server).rewrite(&sample_request()).await;
        assert_eq!(
            outcome,
            SuggestionOutcome::Unavailable(UnavailableReason::EmptyResponse)
        );
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn rewrite_no_choices_or_bad_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let advisor = advisor_for(&server);
        assert_eq!(
            advisor.rewrite(&sample_request()).await,
            SuggestionOutcome::Unavailable(UnavailableReason::EmptyResponse)
        );
        assert!(matches!(
            advisor.rewrite(&sample_request()).await,
            SuggestionOutcome::Unavailable(UnavailableReason::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn rewrite_unreachable_is_network() {
        // port 9 (discard) on localhost is not expected to accept connections
        let config = AdvisorConfig {
            base_url: "http://127.0.0.1:9/v1".into(),
            ..AdvisorConfig::with_api_key("sk-test")
        };
        let advisor = ChatCompletionsAdvisor::new(&config).expect("client");
        let outcome = advisor.rewrite(&sample_request()).await;
        assert!(matches!(
            outcome,
            SuggestionOutcome::Unavailable(UnavailableReason::Network(_))
        ));
    }
}
