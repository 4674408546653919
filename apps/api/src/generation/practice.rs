//! Practice material: flashcards, multiple-choice questions, word games.
//! Each generator runs in its own category so they never contend for slots.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::prompts::{FLASHCARDS_PROMPT, MCQS_PROMPT, WORD_GAME_PROMPT};
use super::GenerationError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, Prompt, ServiceCategory};
use crate::models::content::{FlashcardRow, McqRow, WordGameRow};
use crate::store::{insert_rows, RecordStore, Table};

pub const FLASHCARD_COUNT: usize = 10;
pub const MCQ_COUNT: usize = 10;
pub const WORD_GAME_COUNT: usize = 15;

const DEFAULT_DIFFICULTY: &str = "medium";

#[derive(Debug, Deserialize)]
struct FlashcardDraft {
    question: String,
    answer: String,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct McqDraft {
    question: String,
    options: Vec<String>,
    #[serde(alias = "correct_answer", alias = "correctAnswer")]
    correct: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WordDraft {
    word: String,
    #[serde(alias = "definition")]
    correct: String,
    #[serde(default)]
    incorrect: Vec<String>,
}

fn json_prompt(template: &str, topic: &str) -> Prompt {
    Prompt::new(template.replace("{topic}", topic)).with_system(JSON_ONLY_SYSTEM)
}

pub async fn generate_flashcards(
    llm: &LlmClient,
    store: &dyn RecordStore,
    course_id: Uuid,
    topic: &str,
) -> Result<usize, GenerationError> {
    let drafts: Vec<FlashcardDraft> = llm
        .generate_json(ServiceCategory::Flashcard, &json_prompt(FLASHCARDS_PROMPT, topic))
        .await?;

    let rows: Vec<FlashcardRow> = drafts
        .into_iter()
        .take(FLASHCARD_COUNT)
        .map(|d| FlashcardRow {
            id: Uuid::new_v4(),
            course_id,
            question: d.question,
            answer: d.answer,
            difficulty: d.difficulty.unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
            created_at: Utc::now(),
        })
        .collect();

    insert_rows(store, Table::Flashcards, &rows).await?;
    info!(count = rows.len(), "Flashcards stored");
    Ok(rows.len())
}

pub async fn generate_mcqs(
    llm: &LlmClient,
    store: &dyn RecordStore,
    course_id: Uuid,
    topic: &str,
) -> Result<usize, GenerationError> {
    let drafts: Vec<McqDraft> = llm
        .generate_json(ServiceCategory::Quiz, &json_prompt(MCQS_PROMPT, topic))
        .await?;

    let rows: Vec<McqRow> = drafts
        .into_iter()
        .filter(|d| d.options.len() >= 2)
        .take(MCQ_COUNT)
        .map(|d| McqRow {
            id: Uuid::new_v4(),
            course_id,
            question: d.question,
            options: d.options,
            correct_answer: d.correct,
            explanation: d.explanation,
            difficulty: d.difficulty.unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
            created_at: Utc::now(),
        })
        .collect();

    insert_rows(store, Table::Mcqs, &rows).await?;
    info!(count = rows.len(), "MCQs stored");
    Ok(rows.len())
}

pub async fn generate_word_games(
    llm: &LlmClient,
    store: &dyn RecordStore,
    course_id: Uuid,
    topic: &str,
) -> Result<usize, GenerationError> {
    let drafts: Vec<WordDraft> = llm
        .generate_json(ServiceCategory::Game, &json_prompt(WORD_GAME_PROMPT, topic))
        .await?;

    let rows: Vec<WordGameRow> = drafts
        .into_iter()
        .take(WORD_GAME_COUNT)
        .map(|d| WordGameRow {
            id: Uuid::new_v4(),
            course_id,
            word: d.word,
            definition: d.correct,
            incorrect_options: d.incorrect,
            difficulty: DEFAULT_DIFFICULTY.to_string(),
            created_at: Utc::now(),
        })
        .collect();

    insert_rows(store, Table::WordGames, &rows).await?;
    info!(count = rows.len(), "Word games stored");
    Ok(rows.len())
}
