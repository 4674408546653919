use std::collections::HashMap;

use anyhow::{bail, Context, Result};

use crate::integrations::storage::S3Settings;
use crate::integrations::{brave, elevenlabs};
use crate::llm_client::providers::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_GROQ_BASE_URL, DEFAULT_GROQ_MODEL,
};
use crate::llm_client::{Endpoints, KeyPools, ServiceCategory};

/// Where course records live.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Supabase { url: String, service_key: String },
    Postgres { database_url: String },
}

/// Application configuration loaded from environment variables.
/// Only a record store is required; every provider is optional and the
/// matching pipeline phase is skipped when its credentials are absent.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub store: StoreBackend,
    pub gemini_shared_keys: Vec<String>,
    pub gemini_category_keys: HashMap<ServiceCategory, Vec<String>>,
    pub groq_keys: Vec<String>,
    pub endpoints: Endpoints,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
    pub elevenlabs_base_url: String,
    pub brave_api_key: Option<String>,
    pub brave_base_url: String,
    pub s3: Option<S3Settings>,
}

/// Env variable holding dedicated keys for each Gemini category.
const CATEGORY_KEY_VARS: [(ServiceCategory, &str); 5] = [
    (ServiceCategory::Chapter, "GEMINI_CHAPTER_KEYS"),
    (ServiceCategory::Quiz, "GEMINI_QUIZ_KEYS"),
    (ServiceCategory::Flashcard, "GEMINI_FLASHCARD_KEYS"),
    (ServiceCategory::Game, "GEMINI_GAME_KEYS"),
    (ServiceCategory::Article, "GEMINI_ARTICLE_KEYS"),
];

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store = match (var("SUPABASE_URL"), var("SUPABASE_SERVICE_ROLE_KEY"), var("DATABASE_URL")) {
            (Some(url), Some(service_key), _) => StoreBackend::Supabase { url, service_key },
            (_, _, Some(database_url)) => StoreBackend::Postgres { database_url },
            _ => bail!(
                "No record store configured: set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY, or DATABASE_URL"
            ),
        };

        let mut gemini_shared_keys = key_list(var("GEMINI_API_KEYS"));
        gemini_shared_keys.extend(key_list(var("GEMINI_API_KEY")));
        dedupe(&mut gemini_shared_keys);

        let gemini_category_keys = CATEGORY_KEY_VARS
            .iter()
            .map(|(category, name)| (*category, key_list(var(name))))
            .filter(|(_, keys)| !keys.is_empty())
            .collect();

        let mut groq_keys = key_list(var("GROQ_API_KEYS"));
        groq_keys.extend(key_list(var("GROQ_API_KEY")));
        dedupe(&mut groq_keys);

        let s3 = s3_settings(&var)?;

        Ok(Config {
            port: var("PORT")
                .unwrap_or_else(|| "8008".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            store,
            gemini_shared_keys,
            gemini_category_keys,
            groq_keys,
            endpoints: Endpoints {
                gemini_base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                groq_base_url: var("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
                groq_model: var("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            },
            elevenlabs_api_key: var("ELEVENLABS_API_KEY"),
            elevenlabs_voice_id: var("ELEVENLABS_VOICE_ID")
                .unwrap_or_else(|| elevenlabs::DEFAULT_VOICE_ID.to_string()),
            elevenlabs_base_url: var("ELEVENLABS_BASE_URL")
                .unwrap_or_else(|| elevenlabs::DEFAULT_BASE_URL.to_string()),
            brave_api_key: var("BRAVE_SEARCH_API_KEY"),
            brave_base_url: var("BRAVE_BASE_URL").unwrap_or_else(|| brave::DEFAULT_BASE_URL.to_string()),
            s3,
        })
    }

    /// Resolves every category pool, aliasing empty Gemini categories to the
    /// shared keys.
    pub fn key_pools(&self) -> KeyPools {
        let mut dedicated = self.gemini_category_keys.clone();
        if !self.groq_keys.is_empty() {
            dedicated.insert(ServiceCategory::Groq, self.groq_keys.clone());
        }
        KeyPools::new(self.gemini_shared_keys.clone(), dedicated)
    }
}

/// Splits a comma-separated key list, dropping blanks.
fn key_list(raw: Option<String>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn dedupe(keys: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    keys.retain(|k| seen.insert(k.clone()));
}

/// The audio bucket is all-or-nothing: a partial set of variables is a
/// startup error rather than a silently disabled feature.
fn s3_settings(var: &impl Fn(&str) -> Option<String>) -> Result<Option<S3Settings>> {
    const VARS: [&str; 5] = [
        "S3_BUCKET",
        "S3_ENDPOINT",
        "S3_PUBLIC_URL",
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
    ];
    let values: Vec<Option<String>> = VARS.iter().map(|name| var(name)).collect();

    if values.iter().all(Option::is_none) {
        return Ok(None);
    }
    let missing: Vec<&str> = VARS
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        bail!("Audio storage partially configured, missing: {}", missing.join(", "));
    }

    let mut values = values.into_iter().flatten();
    let mut next = || values.next().unwrap_or_default();
    Ok(Some(S3Settings {
        bucket: next(),
        endpoint: next(),
        public_url: next(),
        access_key_id: next(),
        secret_access_key: next(),
    }))
}
