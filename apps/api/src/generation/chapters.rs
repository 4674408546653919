//! Chapter writer. One call per outline chapter, in outline order.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::outline::CourseOutline;
use super::prompts::CHAPTER_PROMPT;
use super::GenerationError;
use crate::llm_client::prompts::EDUCATOR_SYSTEM;
use crate::llm_client::{LlmClient, Prompt, ServiceCategory};
use crate::models::content::ChapterRow;
use crate::store::{insert_rows, RecordStore, Table};

const WORDS_PER_MINUTE: usize = 200;

static WRAPPING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```(?:markdown|md)?\s*\n(.*?)\n?```\s*$").expect("valid regex")
});

static LEADING_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#{1,6}\s*(.+?)\s*\n").expect("valid regex"));

static EXTRA_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Writes every chapter sequentially and persists them as one batch.
/// Returns the number of chapters stored.
pub async fn generate_chapters(
    llm: &LlmClient,
    store: &dyn RecordStore,
    course_id: Uuid,
    topic: &str,
    outline: &CourseOutline,
) -> Result<usize, GenerationError> {
    let mut rows = Vec::with_capacity(outline.chapters.len());

    for (index, chapter) in outline.chapters.iter().enumerate() {
        let prompt = Prompt::new(
            CHAPTER_PROMPT
                .replace("{topic}", topic)
                .replace("{title}", &chapter.title)
                .replace("{level}", &chapter.level)
                .replace("{objectives}", &chapter.objectives.join(", "))
                .replace("{concepts}", &chapter.key_concepts.join(", ")),
        )
        .with_system(EDUCATOR_SYSTEM);

        let raw = llm.generate(ServiceCategory::Chapter, &prompt).await?;
        let content = clean_chapter_content(&raw, &chapter.title);
        if content.is_empty() {
            warn!(chapter = %chapter.title, "Chapter came back empty after cleanup");
        }

        rows.push(ChapterRow {
            id: Uuid::new_v4(),
            course_id,
            title: chapter.title.clone(),
            estimated_reading_time: reading_minutes(&content),
            content,
            order_number: index as i32 + 1,
            level: chapter.level.clone(),
            created_at: Utc::now(),
        });
    }

    insert_rows(store, Table::Chapters, &rows).await?;
    info!(count = rows.len(), "Chapters stored");
    Ok(rows.len())
}

/// Strips a fence wrapping the whole reply, drops a leading heading that just
/// repeats the chapter title, and collapses runs of blank lines.
pub fn clean_chapter_content(raw: &str, title: &str) -> String {
    let mut text = match WRAPPING_FENCE.captures(raw) {
        Some(caps) => caps[1].to_string(),
        None => raw.to_string(),
    };

    if let Some(caps) = LEADING_HEADING.captures(&text) {
        if same_title(&caps[1], title) {
            let end = caps.get(0).map_or(0, |m| m.end());
            text = text[end..].to_string();
        }
    }

    EXTRA_BLANK_LINES
        .replace_all(text.trim(), "\n\n")
        .into_owned()
}

fn same_title(heading: &str, title: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    };
    let (heading, title) = (normalize(heading), normalize(title));
    !title.is_empty() && (heading == title || heading.ends_with(&title))
}

pub(crate) fn reading_minutes(text: &str) -> i32 {
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}
