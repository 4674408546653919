// Non-LLM upstreams: speech synthesis, web search and the audio bucket.
// Each is optional; the pipeline skips the phase when one is not configured.

use thiserror::Error;

pub mod brave;
pub mod elevenlabs;
pub mod storage;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} refused the request ({reason}): {message}")]
    Refused {
        service: &'static str,
        reason: &'static str,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}
