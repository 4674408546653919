/// LLM Client: the single point of entry for every text-generation call.
///
/// ARCHITECTURAL RULE: generators never talk to Gemini or Groq directly.
/// Every call goes through `LlmClient::invoke`, which owns key rotation,
/// per-category admission control, pacing, backoff and the chapter-pool
/// fallback.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

pub mod category;
pub mod extract;
pub mod key_pool;
pub mod limiter;
pub mod prompts;
pub mod providers;

pub use category::{Provider, ServiceCategory};
pub use key_pool::KeyPools;
pub use limiter::ConcurrencyLimiter;
pub use providers::Endpoints;

pub const MAX_ATTEMPTS: u32 = 5;
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited (status 429): {0}")]
    RateLimited(String),

    #[error("Failed to parse model output: {0}")]
    Parse(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Retries exhausted for category {category}")]
    RetriesExhausted { category: ServiceCategory },

    #[error("Upstream failure for category {category}: {message}")]
    Upstream {
        category: ServiceCategory,
        message: String,
    },
}

/// A provider-neutral prompt: optional system instruction plus user text.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: u32,
}

impl Prompt {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Delay taken before each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// `primary_pacing * (attempt + 1)`.
    Linear,
    /// `audio_pacing`, whatever the attempt.
    Flat,
}

/// Timing knobs shared by every call made through one client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub primary_pacing: Duration,
    pub audio_pacing: Duration,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            primary_pacing: Duration::from_millis(300),
            audio_pacing: Duration::from_millis(500),
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn pacing_delay(&self, pacing: Pacing, attempt: u32) -> Duration {
        match pacing {
            Pacing::Linear => self.primary_pacing * (attempt + 1),
            Pacing::Flat => self.audio_pacing,
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }

    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            primary_pacing: Duration::ZERO,
            audio_pacing: Duration::ZERO,
            backoff_base: Duration::ZERO,
        }
    }
}

/// Per-call settings.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    pub max_attempts: u32,
    pub pacing: Pacing,
    pub timeout: Duration,
}

impl CallOptions {
    /// Main pipeline settings for `category`.
    pub fn primary(category: ServiceCategory) -> Self {
        let timeout = match category {
            ServiceCategory::Chapter | ServiceCategory::Article => Duration::from_secs(45),
            _ => Duration::from_secs(30),
        };
        Self {
            max_attempts: MAX_ATTEMPTS,
            pacing: Pacing::Linear,
            timeout,
        }
    }

    /// Audio-script pipeline settings: flat pacing, longer scripts.
    pub fn audio_script() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            pacing: Pacing::Flat,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Retrying, key-rotating, concurrency-limited client for the text providers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    keys: KeyPools,
    limiter: ConcurrencyLimiter,
    endpoints: Endpoints,
    policy: RetryPolicy,
}

impl LlmClient {
    pub fn new(keys: KeyPools, endpoints: Endpoints, policy: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            keys,
            limiter: ConcurrencyLimiter::new(),
            endpoints,
            policy,
        }
    }

    pub fn has_keys(&self, category: ServiceCategory) -> bool {
        self.keys.has_keys(category)
    }

    /// Generates text with the main pipeline settings for `category`.
    pub async fn generate(&self, category: ServiceCategory, prompt: &Prompt) -> Result<String, LlmError> {
        self.invoke(category, prompt, CallOptions::primary(category))
            .await
    }

    /// Generates text and extracts a JSON value of type `T` from it.
    ///
    /// A reply that does not parse is reported as an upstream failure of
    /// `category`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        category: ServiceCategory,
        prompt: &Prompt,
    ) -> Result<T, LlmError> {
        let text = self.generate(category, prompt).await?;
        extract::parse_json(&text).map_err(|e| match e {
            LlmError::Parse(message) => LlmError::Upstream { category, message },
            other => other,
        })
    }

    /// Makes one logical call, retrying per attempt.
    ///
    /// The category slot is held across the whole retry loop. 429 responses
    /// back off `2^attempt` × base and rotate to the next key; the final 429
    /// gets one extra attempt on the chapter pool before giving up.
    pub async fn invoke(
        &self,
        category: ServiceCategory,
        prompt: &Prompt,
        options: CallOptions,
    ) -> Result<String, LlmError> {
        self.limiter
            .with_slot(category, || self.attempt_loop(category, prompt, options))
            .await
    }

    async fn attempt_loop(
        &self,
        category: ServiceCategory,
        prompt: &Prompt,
        options: CallOptions,
    ) -> Result<String, LlmError> {
        let provider = category.provider();

        for attempt in 0..options.max_attempts {
            let is_last = attempt + 1 == options.max_attempts;

            let delay = self.policy.pacing_delay(options.pacing, attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let api_key = self.keys.acquire(category)?;

            match self.send(provider, &api_key, prompt, options.timeout).await {
                Ok(text) => {
                    debug!(category = %category, attempt = attempt + 1, "LLM call succeeded");
                    return Ok(text);
                }
                Err(LlmError::RateLimited(body)) if !is_last => {
                    let backoff = self.policy.backoff_delay(attempt);
                    warn!(
                        category = %category,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "Rate limited, rotating key: {body}"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(LlmError::RateLimited(_)) => {
                    warn!(category = %category, "Rate limited on final attempt, trying chapter pool");
                    return self
                        .fallback(category, prompt, options.timeout)
                        .await
                        .ok_or(LlmError::RetriesExhausted { category });
                }
                Err(e) if !is_last => {
                    warn!(category = %category, attempt = attempt + 1, "LLM call failed, retrying: {e}");
                }
                Err(e) => {
                    return Err(LlmError::Upstream {
                        category,
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(LlmError::RetriesExhausted { category })
    }

    async fn fallback(&self, category: ServiceCategory, prompt: &Prompt, timeout: Duration) -> Option<String> {
        let api_key = self.keys.acquire(ServiceCategory::Chapter).ok()?;
        match self.send(Provider::Gemini, &api_key, prompt, timeout).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(category = %category, "Chapter-pool fallback failed: {e}");
                None
            }
        }
    }

    async fn send(
        &self,
        provider: Provider,
        api_key: &str,
        prompt: &Prompt,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let response = providers::build_request(
            &self.client,
            &self.endpoints,
            provider,
            api_key,
            prompt,
            timeout,
        )
        .send()
        .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RateLimited(body));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        providers::read_text(provider, response).await
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::test_support::*;
    use super::*;

    const GEMINI_PATH: &str = "/v1beta/models/gemini-2.0-flash-exp:generateContent";

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("hello")))
            .expect(1)
            .mount(&server)
            .await;

        let llm = client_for(&server.uri(), &["k1"]);
        let text = llm
            .generate(ServiceCategory::Quiz, &Prompt::new("hi"))
            .await
            .unwrap();

        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_rate_limited_until_last_attempt_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .up_to_n_times(MAX_ATTEMPTS as u64 - 1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("finally")))
            .mount(&server)
            .await;

        let llm = client_for(&server.uri(), &["k1"]);
        let text = llm
            .generate(ServiceCategory::Flashcard, &Prompt::new("hi"))
            .await
            .unwrap();

        assert_eq!(text, "finally");
        let calls = server.received_requests().await.unwrap();
        assert_eq!(calls.len(), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_always_rate_limited_exhausts_with_one_fallback_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let llm = client_for(&server.uri(), &["k1"]);
        let err = llm
            .generate(ServiceCategory::Game, &Prompt::new("hi"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LlmError::RetriesExhausted {
                category: ServiceCategory::Game
            }
        ));
        let calls = server.received_requests().await.unwrap();
        assert_eq!(calls.len(), MAX_ATTEMPTS as usize + 1);
    }

    #[tokio::test]
    async fn test_keys_rotate_between_rate_limited_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "first"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("key", "second"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("ok")))
            .mount(&server)
            .await;

        let mut dedicated = HashMap::new();
        dedicated.insert(
            ServiceCategory::Quiz,
            vec!["first".to_string(), "second".to_string()],
        );
        let llm = client_with_pools(&server.uri(), &[], dedicated);

        let text = llm
            .generate(ServiceCategory::Quiz, &Prompt::new("hi"))
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_final_rate_limit_falls_back_to_chapter_pool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "quiz-key"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("key", "chapter-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("rescued")))
            .expect(1)
            .mount(&server)
            .await;

        let mut dedicated = HashMap::new();
        dedicated.insert(ServiceCategory::Quiz, vec!["quiz-key".to_string()]);
        dedicated.insert(ServiceCategory::Chapter, vec!["chapter-key".to_string()]);
        let llm = client_with_pools(&server.uri(), &[], dedicated);

        let text = llm
            .generate(ServiceCategory::Quiz, &Prompt::new("hi"))
            .await
            .unwrap();
        assert_eq!(text, "rescued");
    }

    #[tokio::test]
    async fn test_server_errors_become_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let llm = client_for(&server.uri(), &["k1"]);
        let err = llm
            .generate(ServiceCategory::Article, &Prompt::new("hi"))
            .await
            .unwrap_err();

        match err {
            LlmError::Upstream { category, message } => {
                assert_eq!(category, ServiceCategory::Article);
                assert!(message.contains("boom"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
        let calls = server.received_requests().await.unwrap();
        assert_eq!(calls.len(), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_any_request() {
        let server = MockServer::start().await;
        let llm = client_for(&server.uri(), &[]);

        let err = llm
            .generate(ServiceCategory::Chapter, &Prompt::new("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Configuration(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_groq_category_uses_chat_completions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(groq_reply("from groq")))
            .expect(1)
            .mount(&server)
            .await;

        let mut dedicated = HashMap::new();
        dedicated.insert(ServiceCategory::Groq, vec!["gsk".to_string()]);
        let llm = client_with_pools(&server.uri(), &[], dedicated);

        let text = llm
            .invoke(
                ServiceCategory::Groq,
                &Prompt::new("hi").with_system("be brief"),
                CallOptions::audio_script(),
            )
            .await
            .unwrap();
        assert_eq!(text, "from groq");
    }

    #[test]
    fn test_pacing_and_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.pacing_delay(Pacing::Linear, 2),
            Duration::from_millis(900)
        );
        assert_eq!(
            policy.pacing_delay(Pacing::Flat, 4),
            Duration::from_millis(500)
        );
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(8));
    }
}
