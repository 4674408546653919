mod config;
mod db;
mod errors;
mod generation;
mod integrations;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::db::create_pool;
use crate::generation::orchestrator::CourseOrchestrator;
use crate::integrations::brave::SearchClient;
use crate::integrations::elevenlabs::TtsClient;
use crate::integrations::storage::S3AudioStorage;
use crate::llm_client::{LlmClient, RetryPolicy, ServiceCategory};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PostgresStore;
use crate::store::supabase::SupabaseStore;
use crate::store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing record store)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting course generation API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the record store
    let store: Arc<dyn RecordStore> = match &config.store {
        StoreBackend::Supabase { url, service_key } => {
            Arc::new(SupabaseStore::new(url, service_key.clone()))
        }
        StoreBackend::Postgres { database_url } => {
            Arc::new(PostgresStore::new(create_pool(database_url).await?))
        }
    };
    info!("Record store initialized ({})", store.backend());

    // Initialize LLM client with per-category key pools
    let llm = LlmClient::new(
        config.key_pools(),
        config.endpoints.clone(),
        RetryPolicy::default(),
    );
    if !llm.has_keys(ServiceCategory::Chapter) {
        warn!("No Gemini keys configured; course generation requests will be rejected");
    }
    info!(
        "LLM client initialized (model: {})",
        config.endpoints.gemini_model
    );

    let mut orchestrator = CourseOrchestrator::new(llm, Arc::clone(&store));

    // Speech synthesis needs both an ElevenLabs key and somewhere to put the audio
    match (&config.elevenlabs_api_key, &config.s3) {
        (Some(api_key), Some(s3)) => {
            let tts = TtsClient::new(
                api_key.clone(),
                &config.elevenlabs_base_url,
                config.elevenlabs_voice_id.clone(),
            );
            let storage = S3AudioStorage::connect(s3).await;
            orchestrator = orchestrator.with_tts(tts, Arc::new(storage));
            info!("ElevenLabs TTS enabled");
        }
        (Some(_), None) => warn!("ELEVENLABS_API_KEY set without audio storage; using browser TTS only"),
        _ => info!("ElevenLabs TTS disabled; using browser TTS only"),
    }

    if let Some(api_key) = &config.brave_api_key {
        orchestrator = orchestrator.with_search(SearchClient::new(api_key.clone(), &config.brave_base_url));
        info!("Brave resource search enabled");
    }

    // Build app state
    let state = AppState {
        store,
        orchestrator,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
