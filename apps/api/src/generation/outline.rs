//! Outline generation. The only step whose failure sinks the whole job.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generation::prompts::{OUTLINE_CORRECTION_PROMPT, OUTLINE_PROMPT};
use crate::llm_client::extract::parse_json;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError, Prompt, ServiceCategory};

pub const MIN_CHAPTERS: usize = 5;
pub const MAX_CHAPTERS: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineChapter {
    pub title: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    #[serde(default = "default_minutes")]
    pub estimated_minutes: u32,
}

fn default_level() -> String {
    "intermediate".to_string()
}

fn default_minutes() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOutline {
    pub chapters: Vec<OutlineChapter>,
}

impl CourseOutline {
    pub fn chapter_titles(&self) -> String {
        self.chapters
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Generates a 5 to 7 chapter outline for `topic`.
///
/// A reply with fewer than [`MIN_CHAPTERS`] chapters, or one that does not
/// parse, gets exactly one corrective re-prompt. The corrective outline is
/// used only when it is at least as long as the first one; otherwise the
/// first outline is kept when it has any chapters at all.
pub async fn generate_outline(llm: &LlmClient, topic: &str) -> Result<CourseOutline, LlmError> {
    let prompt = Prompt::new(OUTLINE_PROMPT.replace("{topic}", topic)).with_system(JSON_ONLY_SYSTEM);
    let first = llm.generate(ServiceCategory::Chapter, &prompt).await?;

    let (problem, partial) = match parse_json::<CourseOutline>(&first) {
        Ok(outline) if outline.chapters.len() >= MIN_CHAPTERS => return Ok(capped(outline)),
        Ok(outline) => {
            warn!(
                chapters = outline.chapters.len(),
                "Outline below minimum chapter count, re-prompting"
            );
            (
                format!(
                    "Your previous outline had only {} chapters.",
                    outline.chapters.len()
                ),
                Some(outline),
            )
        }
        Err(e) => {
            warn!("Outline reply did not parse, re-prompting: {e}");
            ("Your previous reply was not valid JSON.".to_string(), None)
        }
    };

    let corrective = Prompt::new(
        OUTLINE_CORRECTION_PROMPT
            .replace("{topic}", topic)
            .replace("{problem}", &problem),
    )
    .with_system(JSON_ONLY_SYSTEM);

    let retried = match llm.generate(ServiceCategory::Chapter, &corrective).await {
        Ok(text) => parse_json::<CourseOutline>(&text),
        Err(e) => Err(e),
    };

    let floor = partial.as_ref().map_or(1, |p| p.chapters.len().max(1));

    match (retried, partial) {
        (Ok(outline), _) if outline.chapters.len() >= floor => {
            info!(chapters = outline.chapters.len(), "Corrected outline accepted");
            Ok(capped(outline))
        }
        (_, Some(partial)) if !partial.chapters.is_empty() => {
            warn!(
                chapters = partial.chapters.len(),
                "Corrective outline unusable, keeping the short outline"
            );
            Ok(partial)
        }
        (Err(e), _) => Err(e),
        (Ok(_), _) => Err(LlmError::Parse("outline contained no chapters".to_string())),
    }
}

fn capped(mut outline: CourseOutline) -> CourseOutline {
    outline.chapters.truncate(MAX_CHAPTERS);
    outline
}
