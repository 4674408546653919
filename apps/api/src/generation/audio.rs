//! Audio: narration scripts, browser-read rows and optional ElevenLabs
//! synthesis. Nothing in here fails the course.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::outline::CourseOutline;
use super::prompts::{LONG_SCRIPT_PROMPT, SHORT_SCRIPT_PROMPT};
use super::GenerationError;
use crate::integrations::elevenlabs::TtsClient;
use crate::integrations::storage::AudioStorage;
use crate::llm_client::prompts::EDUCATOR_SYSTEM;
use crate::llm_client::{CallOptions, LlmClient, Prompt, ServiceCategory};
use crate::models::content::{AudioRow, AudioType, TtsProvider};
use crate::store::{insert_rows, Filter, RecordStore, StoreError, Table};

const SHORT_SCRIPT_TOKENS: u32 = 2048;
const LONG_SCRIPT_TOKENS: u32 = 8192;

#[derive(Debug, Clone, Default)]
pub struct AudioScripts {
    pub short: String,
    pub long: String,
}

impl AudioScripts {
    pub fn script(&self, audio_type: AudioType) -> &str {
        match audio_type {
            AudioType::ShortPodcast => &self.short,
            AudioType::FullLecture => &self.long,
        }
    }
}

/// Writes the short podcast and the full lecture scripts.
///
/// Groq is tried first when it has keys, then the chapter pool of the
/// primary provider. A script no provider could write is replaced with a
/// two-sentence placeholder, so this never fails.
pub async fn generate_audio_scripts(llm: &LlmClient, topic: &str, outline: &CourseOutline) -> AudioScripts {
    let chapters = outline.chapter_titles();
    let fill = |template: &str| template.replace("{topic}", topic).replace("{chapters}", &chapters);

    let short = Prompt::new(fill(SHORT_SCRIPT_PROMPT))
        .with_system(EDUCATOR_SYSTEM)
        .with_max_tokens(SHORT_SCRIPT_TOKENS);
    let long = Prompt::new(fill(LONG_SCRIPT_PROMPT))
        .with_system(EDUCATOR_SYSTEM)
        .with_max_tokens(LONG_SCRIPT_TOKENS);

    AudioScripts {
        short: script_or_placeholder(llm, &short, AudioType::ShortPodcast, topic).await,
        long: script_or_placeholder(llm, &long, AudioType::FullLecture, topic).await,
    }
}

async fn script_or_placeholder(llm: &LlmClient, prompt: &Prompt, audio_type: AudioType, topic: &str) -> String {
    if llm.has_keys(ServiceCategory::Groq) {
        match llm
            .invoke(ServiceCategory::Groq, prompt, CallOptions::audio_script())
            .await
        {
            Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
            Ok(_) => warn!(audio_type = audio_type.as_str(), "Groq returned an empty script"),
            Err(e) => warn!(audio_type = audio_type.as_str(), "Groq script failed, using primary provider: {e}"),
        }
    }

    match llm
        .invoke(ServiceCategory::Chapter, prompt, CallOptions::audio_script())
        .await
    {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => placeholder_script(audio_type, topic),
        Err(e) => {
            warn!(audio_type = audio_type.as_str(), "Script generation failed, using placeholder: {e}");
            placeholder_script(audio_type, topic)
        }
    }
}

pub fn placeholder_script(audio_type: AudioType, topic: &str) -> String {
    match audio_type {
        AudioType::ShortPodcast => format!(
            "Welcome to this short introduction to {topic}. \
             In the chapters of this course you will learn the core ideas of {topic} step by step."
        ),
        AudioType::FullLecture => format!(
            "Welcome to this lecture on {topic}. \
             Work through each chapter of the course to build a complete understanding of {topic}."
        ),
    }
}

/// Stores both scripts as `browser` rows read aloud client-side.
pub async fn persist_browser_audio(
    store: &dyn RecordStore,
    course_id: Uuid,
    scripts: &AudioScripts,
) -> Result<usize, GenerationError> {
    let rows: Vec<AudioRow> = [AudioType::ShortPodcast, AudioType::FullLecture]
        .into_iter()
        .filter(|t| !scripts.script(*t).is_empty())
        .map(|audio_type| AudioRow {
            id: Uuid::new_v4(),
            course_id,
            audio_type,
            tts_provider: TtsProvider::Browser,
            audio_url: None,
            script_text: scripts.script(audio_type).to_string(),
            duration_seconds: audio_type.duration_seconds(),
            voice_used: None,
            created_at: Utc::now(),
        })
        .collect();

    insert_rows(store, Table::Audio, &rows).await?;
    Ok(rows.len())
}

/// Synthesizes `script`, uploads the MP3 and records an `elevenlabs` row.
/// Returns whether every step reported success; failures are logged only.
pub async fn synthesize_audio(
    tts: &TtsClient,
    storage: &dyn AudioStorage,
    store: &dyn RecordStore,
    course_id: Uuid,
    audio_type: AudioType,
    script: &str,
) -> bool {
    if script.trim().is_empty() {
        return false;
    }

    let audio = match tts.synthesize(script).await {
        Ok(audio) => audio,
        Err(e) => {
            warn!(audio_type = audio_type.as_str(), "Speech synthesis failed: {e}");
            return false;
        }
    };

    let key = format!("courses/{course_id}/{}.mp3", audio_type.as_str());
    let audio_url = match storage.put_audio(&key, audio).await {
        Ok(url) => url,
        Err(e) => {
            warn!(audio_type = audio_type.as_str(), "Audio upload failed: {e}");
            return false;
        }
    };

    let row = AudioRow {
        id: Uuid::new_v4(),
        course_id,
        audio_type,
        tts_provider: TtsProvider::Elevenlabs,
        audio_url: Some(audio_url),
        script_text: script.to_string(),
        duration_seconds: audio_type.duration_seconds(),
        voice_used: Some(tts.voice_label().to_string()),
        created_at: Utc::now(),
    };

    match insert_rows(store, Table::Audio, &[row]).await {
        Ok(()) => {
            info!(audio_type = audio_type.as_str(), "Synthesized audio stored");
            true
        }
        Err(e) => {
            warn!(audio_type = audio_type.as_str(), "Audio row write failed: {e}");
            false
        }
    }
}

/// Whether any synthesized audio row for the course is actually readable.
/// A write that reported success is not trusted on its own.
pub async fn tts_audio_present(store: &dyn RecordStore, course_id: Uuid) -> Result<bool, StoreError> {
    store
        .exists(
            Table::Audio,
            &Filter::eq("course_id", course_id).and_eq("tts_provider", TtsProvider::Elevenlabs.as_str()),
        )
        .await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::generation::test_support::{outline_json, MemoryAudioStorage};
    use crate::integrations::elevenlabs::DEFAULT_VOICE_ID;
    use crate::llm_client::extract::parse_json;
    use crate::llm_client::test_support::{client_for, client_with_pools, gemini_reply, groq_reply};
    use crate::store::memory::MemoryStore;

    fn outline() -> CourseOutline {
        parse_json(&outline_json(5)).unwrap()
    }

    #[tokio::test]
    async fn test_groq_writes_scripts_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(groq_reply("groq script")))
            .expect(2)
            .mount(&server)
            .await;

        let mut dedicated = HashMap::new();
        dedicated.insert(ServiceCategory::Groq, vec!["gsk".to_string()]);
        let llm = client_with_pools(&server.uri(), &["gemini"], dedicated);

        let scripts = generate_audio_scripts(&llm, "Rust", &outline()).await;
        assert_eq!(scripts.short, "groq script");
        assert_eq!(scripts.long, "groq script");
    }

    #[tokio::test]
    async fn test_primary_provider_used_without_groq_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("gemini script")))
            .mount(&server)
            .await;

        let scripts = generate_audio_scripts(&client_for(&server.uri(), &["k"]), "Rust", &outline()).await;
        assert_eq!(scripts.short, "gemini script");
        let calls = server.received_requests().await.unwrap();
        assert!(calls.iter().all(|r| r.url.path().contains("generateContent")));
    }

    #[tokio::test]
    async fn test_every_provider_failing_yields_placeholders() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut dedicated = HashMap::new();
        dedicated.insert(ServiceCategory::Groq, vec!["gsk".to_string()]);
        let llm = client_with_pools(&server.uri(), &["k"], dedicated);

        let scripts = generate_audio_scripts(&llm, "Rust", &outline()).await;
        assert_eq!(scripts.short, placeholder_script(AudioType::ShortPodcast, "Rust"));
        assert_eq!(scripts.long, placeholder_script(AudioType::FullLecture, "Rust"));
    }

    #[tokio::test]
    async fn test_browser_rows_for_both_scripts() {
        let store = MemoryStore::new();
        let scripts = AudioScripts {
            short: "short".to_string(),
            long: "long".to_string(),
        };

        let stored = persist_browser_audio(&store, Uuid::new_v4(), &scripts).await.unwrap();

        assert_eq!(stored, 2);
        let rows = store.rows(Table::Audio);
        assert!(rows.iter().all(|r| r["tts_provider"] == "browser"));
        assert_eq!(rows[1]["duration_seconds"], 1200);
    }

    #[tokio::test]
    async fn test_synthesis_uploads_and_records_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
            .mount(&server)
            .await;

        let tts = TtsClient::new("xi".to_string(), &server.uri(), DEFAULT_VOICE_ID.to_string());
        let storage = MemoryAudioStorage::default();
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();

        let ok = synthesize_audio(&tts, &storage, &store, course_id, AudioType::ShortPodcast, "hello").await;

        assert!(ok);
        assert_eq!(
            storage.keys.lock().unwrap()[0],
            format!("courses/{course_id}/short_podcast.mp3")
        );
        assert!(tts_audio_present(&store, course_id).await.unwrap());
        assert_eq!(store.rows(Table::Audio)[0]["voice_used"], "Aria");
    }

    #[tokio::test]
    async fn test_quota_refusal_persists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"detail":{"status":"quota_exceeded"}}"#))
            .mount(&server)
            .await;

        let tts = TtsClient::new("xi".to_string(), &server.uri(), DEFAULT_VOICE_ID.to_string());
        let storage = MemoryAudioStorage::default();
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();

        let ok = synthesize_audio(&tts, &storage, &store, course_id, AudioType::FullLecture, "hello").await;

        assert!(!ok);
        assert!(storage.keys.lock().unwrap().is_empty());
        assert!(!tts_audio_present(&store, course_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_browser_rows_do_not_count_as_synthesized() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        persist_browser_audio(
            &store,
            course_id,
            &AudioScripts {
                short: "s".to_string(),
                long: "l".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(!tts_audio_present(&store, course_id).await.unwrap());
    }
}
