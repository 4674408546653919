//! Long-form articles: deep dive, key takeaways, FAQ.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::chapters::reading_minutes;
use super::prompts::{DEEP_DIVE_PROMPT, FAQ_PROMPT, TAKEAWAYS_PROMPT};
use super::GenerationError;
use crate::llm_client::prompts::{EDUCATOR_SYSTEM, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmError, Prompt, ServiceCategory};
use crate::models::content::{ArticleRow, ArticleType};
use crate::store::{insert_rows, RecordStore, Table};

#[derive(Debug, Serialize, Deserialize)]
struct FaqEntry {
    question: String,
    answer: String,
}

/// Generates the three articles one after another (the article category
/// admits a single call at a time) and stores them together.
pub async fn generate_articles(
    llm: &LlmClient,
    store: &dyn RecordStore,
    course_id: Uuid,
    topic: &str,
) -> Result<usize, GenerationError> {
    let prose = |template: &str| Prompt::new(template.replace("{topic}", topic)).with_system(EDUCATOR_SYSTEM);

    let deep_dive = llm
        .generate(ServiceCategory::Article, &prose(DEEP_DIVE_PROMPT))
        .await?;
    let takeaways = llm
        .generate(ServiceCategory::Article, &prose(TAKEAWAYS_PROMPT))
        .await?;

    let faq_prompt = Prompt::new(FAQ_PROMPT.replace("{topic}", topic)).with_system(JSON_ONLY_SYSTEM);
    let faq: Vec<FaqEntry> = llm
        .generate_json(ServiceCategory::Article, &faq_prompt)
        .await?;
    let faq = serde_json::to_string(&faq).map_err(|e| LlmError::Parse(e.to_string()))?;

    let rows = vec![
        article(course_id, ArticleType::DeepDive, format!("Deep Dive: {topic}"), deep_dive),
        article(course_id, ArticleType::KeyTakeaways, format!("Key Takeaways: {topic}"), takeaways),
        article(course_id, ArticleType::Faq, format!("FAQ: {topic}"), faq),
    ];

    insert_rows(store, Table::Articles, &rows).await?;
    info!(count = rows.len(), "Articles stored");
    Ok(rows.len())
}

fn article(course_id: Uuid, article_type: ArticleType, title: String, content: String) -> ArticleRow {
    ArticleRow {
        id: Uuid::new_v4(),
        course_id,
        article_type,
        title,
        reading_time_minutes: reading_minutes(&content),
        content: content.trim().to_string(),
        created_at: Utc::now(),
    }
}
