// Course generation pipeline.
// Outline first, then six content generators fanned out in parallel, then the
// audio / resource / suggestion phases. All LLM calls go through llm_client.

use thiserror::Error;

use crate::integrations::IntegrationError;
use crate::llm_client::LlmError;
use crate::store::StoreError;

pub mod articles;
pub mod audio;
pub mod chapters;
pub mod handlers;
pub mod orchestrator;
pub mod outline;
pub mod practice;
pub mod prompts;
pub mod resources;

#[cfg(test)]
pub(crate) mod test_support;

/// Failure of a single generator. Never crosses into a sibling generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Integration(#[from] IntegrationError),
}
