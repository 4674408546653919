//! Row shapes for generated course content. One table per artifact kind,
//! every row tagged with its `course_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: String,
    pub order_number: i32,
    pub level: String,
    pub estimated_reading_time: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub question: String,
    pub answer: String,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleType {
    DeepDive,
    KeyTakeaways,
    Faq,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub article_type: ArticleType,
    pub title: String,
    pub content: String,
    pub reading_time_minutes: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordGameRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub word: String,
    pub definition: String,
    pub incorrect_options: Vec<String>,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioType {
    ShortPodcast,
    FullLecture,
}

impl AudioType {
    pub fn as_str(self) -> &'static str {
        match self {
            AudioType::ShortPodcast => "short_podcast",
            AudioType::FullLecture => "full_lecture",
        }
    }

    pub fn duration_seconds(self) -> i32 {
        match self {
            AudioType::ShortPodcast => 300,
            AudioType::FullLecture => 1200,
        }
    }
}

/// Who turns the script into sound. `Browser` rows carry only the script
/// and are read aloud client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsProvider {
    Browser,
    Elevenlabs,
}

impl TtsProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            TtsProvider::Browser => "browser",
            TtsProvider::Elevenlabs => "elevenlabs",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub audio_type: AudioType,
    pub tts_provider: TtsProvider,
    pub audio_url: Option<String>,
    pub script_text: String,
    pub duration_seconds: i32,
    pub voice_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub resource_type: String,
    pub url: String,
    pub description: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub suggestion_topic: String,
    pub suggestion_description: String,
    pub relevance_score: i32,
    pub created_at: DateTime<Utc>,
}
