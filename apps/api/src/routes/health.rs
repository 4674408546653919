use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::llm_client::ServiceCategory;
use crate::state::AppState;

/// GET /health
/// Reports service version and which optional providers are configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let llm = state.orchestrator.llm();
    Json(json!({
        "status": "ok",
        "service": "course-generation",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend(),
        "has_gemini": llm.has_keys(ServiceCategory::Chapter),
        "has_groq": llm.has_keys(ServiceCategory::Groq),
        "has_elevenlabs": state.config.elevenlabs_api_key.is_some(),
        "has_brave": state.orchestrator.search_enabled(),
        "has_audio_storage": state.config.s3.is_some(),
        "tts_enabled": state.orchestrator.tts_enabled(),
    }))
}
