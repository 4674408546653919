//! External reading and "continue learning" suggestions. Both run after the
//! main content is stored and neither can fail the course.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::prompts::{RESOURCE_QUERY, SUGGESTIONS_PROMPT};
use super::GenerationError;
use crate::integrations::brave::SearchClient;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, Prompt, ServiceCategory};
use crate::models::content::{ResourceRow, SuggestionRow};
use crate::store::{insert_rows, RecordStore, Table};

pub const MAX_RESOURCES: usize = 5;
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Deserialize)]
struct SuggestionDraft {
    topic: String,
    #[serde(default)]
    description: String,
}

/// Top web results for the topic, stored as `article` resources.
pub async fn find_resources(
    search: &SearchClient,
    store: &dyn RecordStore,
    course_id: Uuid,
    topic: &str,
) -> Result<usize, GenerationError> {
    let results = search.search(&RESOURCE_QUERY.replace("{topic}", topic)).await?;

    let rows: Vec<ResourceRow> = results
        .into_iter()
        .take(MAX_RESOURCES)
        .map(|r| ResourceRow {
            id: Uuid::new_v4(),
            course_id,
            provider: r.host(),
            title: r.title,
            resource_type: "article".to_string(),
            url: r.url,
            description: r.description,
            created_at: Utc::now(),
        })
        .collect();

    insert_rows(store, Table::Resources, &rows).await?;
    info!(count = rows.len(), "Resources stored");
    Ok(rows.len())
}

/// Up to five follow-up topics, most relevant first (relevance 5 down to 1).
pub async fn generate_suggestions(
    llm: &LlmClient,
    store: &dyn RecordStore,
    course_id: Uuid,
    topic: &str,
) -> Result<usize, GenerationError> {
    let prompt = Prompt::new(SUGGESTIONS_PROMPT.replace("{topic}", topic)).with_system(JSON_ONLY_SYSTEM);
    let drafts: Vec<SuggestionDraft> = llm.generate_json(ServiceCategory::Quiz, &prompt).await?;

    let rows: Vec<SuggestionRow> = drafts
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .enumerate()
        .map(|(i, d)| SuggestionRow {
            id: Uuid::new_v4(),
            course_id,
            suggestion_topic: d.topic,
            suggestion_description: d.description,
            relevance_score: (MAX_SUGGESTIONS - i) as i32,
            created_at: Utc::now(),
        })
        .collect();

    insert_rows(store, Table::Suggestions, &rows).await?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::llm_client::test_support::{client_for, gemini_reply};
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_resources_take_top_five_with_host_provider() {
        let server = MockServer::start().await;
        let results: Vec<_> = (0..8)
            .map(|i| json!({"title": format!("R{i}"), "url": format!("https://site{i}.dev/page")}))
            .collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"web": {"results": results}})))
            .mount(&server)
            .await;

        let search = SearchClient::new("brave".to_string(), &server.uri());
        let store = MemoryStore::new();
        let count = find_resources(&search, &store, Uuid::new_v4(), "Rust").await.unwrap();

        assert_eq!(count, MAX_RESOURCES);
        let rows = store.rows(Table::Resources);
        assert_eq!(rows[0]["provider"], "site0.dev");
        assert_eq!(rows[0]["resource_type"], "article");
    }

    #[tokio::test]
    async fn test_suggestions_ranked_five_to_one() {
        let server = MockServer::start().await;
        let reply: Vec<_> = (0..5)
            .map(|i| json!({"topic": format!("T{i}"), "description": "next"}))
            .collect();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&json!(reply).to_string())))
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        generate_suggestions(&client_for(&server.uri(), &["k"]), &store, Uuid::new_v4(), "Rust")
            .await
            .unwrap();

        let scores: Vec<i64> = store
            .rows(Table::Suggestions)
            .iter()
            .map(|r| r["relevance_score"].as_i64().unwrap())
            .collect();
        assert_eq!(scores, vec![5, 4, 3, 2, 1]);
    }
}
