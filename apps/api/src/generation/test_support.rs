use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use crate::integrations::storage::AudioStorage;
use crate::integrations::IntegrationError;

/// Outline reply text with `n` chapters.
pub fn outline_json(n: usize) -> String {
    let chapters: Vec<_> = (1..=n)
        .map(|i| {
            json!({
                "title": format!("Chapter {i}"),
                "level": if i <= 2 { "basic" } else { "intermediate" },
                "objectives": [format!("Understand part {i}")],
                "keyConcepts": [format!("concept {i}")],
                "estimatedMinutes": 10
            })
        })
        .collect();
    json!({ "chapters": chapters }).to_string()
}

/// Audio bucket that keeps uploads in memory.
#[derive(Default)]
pub struct MemoryAudioStorage {
    pub keys: Mutex<Vec<String>>,
}

#[async_trait]
impl AudioStorage for MemoryAudioStorage {
    async fn put_audio(&self, key: &str, _audio: Bytes) -> Result<String, IntegrationError> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(format!("https://cdn.test/course-audio/{key}"))
    }
}
