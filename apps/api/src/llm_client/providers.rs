//! Wire formats for the two text-generation APIs.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use super::category::Provider;
use super::{LlmError, Prompt};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-70b-versatile";

const TEMPERATURE: f32 = 0.7;

/// Base URLs and model names for the upstream providers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub groq_base_url: String,
    pub groq_model: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
        }
    }
}

// ── Gemini generateContent ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

// ── Groq chat completions (OpenAI-compatible) ───────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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
    content: Option<String>,
}

pub(super) fn build_request(
    client: &Client,
    endpoints: &Endpoints,
    provider: Provider,
    api_key: &str,
    prompt: &Prompt,
    timeout: Duration,
) -> RequestBuilder {
    match provider {
        Provider::Gemini => {
            let url = format!(
                "{}/v1beta/models/{}:generateContent",
                endpoints.gemini_base_url.trim_end_matches('/'),
                endpoints.gemini_model
            );
            let body = GeminiRequest {
                contents: vec![GeminiContent {
                    parts: vec![GeminiPart { text: &prompt.user }],
                }],
                system_instruction: prompt.system.as_deref().map(|text| GeminiContent {
                    parts: vec![GeminiPart { text }],
                }),
                generation_config: GeminiGenerationConfig {
                    temperature: TEMPERATURE,
                    max_output_tokens: prompt.max_tokens,
                },
            };
            client
                .post(url)
                .query(&[("key", api_key)])
                .timeout(timeout)
                .json(&body)
        }
        Provider::Groq => {
            let url = format!(
                "{}/openai/v1/chat/completions",
                endpoints.groq_base_url.trim_end_matches('/')
            );
            let mut messages = Vec::with_capacity(2);
            if let Some(system) = prompt.system.as_deref() {
                messages.push(ChatMessage {
                    role: "system",
                    content: system,
                });
            }
            messages.push(ChatMessage {
                role: "user",
                content: &prompt.user,
            });
            let body = ChatRequest {
                model: &endpoints.groq_model,
                messages,
                temperature: TEMPERATURE,
                max_tokens: prompt.max_tokens,
            };
            client
                .post(url)
                .bearer_auth(api_key)
                .timeout(timeout)
                .json(&body)
        }
    }
}

/// Pulls the generated text out of a successful provider response.
pub(super) async fn read_text(provider: Provider, response: Response) -> Result<String, LlmError> {
    let text = match provider {
        Provider::Gemini => {
            let body: GeminiResponse = response.json().await?;
            body.candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        }
        Provider::Groq => {
            let body: ChatResponse = response.json().await?;
            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
        }
    };

    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(LlmError::EmptyContent),
    }
}
