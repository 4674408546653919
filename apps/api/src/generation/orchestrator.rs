//! Course Orchestrator: drives one course from empty job to published.
//!
//! Flow: outline → six generators fanned out with `tokio::join!` → audio
//! (browser rows, optional synthesis) → resources → suggestions → finalize.
//!
//! Only the outline is fatal. Every other generator settles to an empty
//! default, so a course is published with whatever content succeeded.
//! Progress is written to the job row at fixed milestones.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::articles::generate_articles;
use super::audio::{generate_audio_scripts, persist_browser_audio, synthesize_audio, tts_audio_present};
use super::chapters::generate_chapters;
use super::outline::generate_outline;
use super::practice::{generate_flashcards, generate_mcqs, generate_word_games};
use super::resources::{find_resources, generate_suggestions};
use super::GenerationError;
use crate::errors::AppError;
use crate::integrations::brave::SearchClient;
use crate::integrations::elevenlabs::TtsClient;
use crate::integrations::storage::AudioStorage;
use crate::llm_client::{LlmClient, LlmError, ServiceCategory};
use crate::models::content::AudioType;
use crate::models::course::{CoursePatch, CourseRow, CourseStatus, GenerationJobRow, JobPatch};
use crate::store::{create_course, create_job, update_course, update_job, RecordStore, StoreError};

/// Minutes of study estimated per chapter.
const MINUTES_PER_CHAPTER: usize = 15;

/// Rough wall-clock time of a full run, reported to clients on submission.
pub const ESTIMATED_SECONDS: u64 = 40;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Outline generation failed: {0}")]
    Outline(#[source] LlmError),

    #[error("Record store failure: {0}")]
    Store(#[from] StoreError),
}

/// Fixed progress milestones written to the job row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Outline,
    OutlineReady,
    Dispatch,
    Aggregated,
    BrowserAudio,
    Synthesis,
    Resources,
    Suggestions,
}

impl Stage {
    pub fn progress(self) -> i32 {
        match self {
            Stage::Outline => 10,
            Stage::OutlineReady => 15,
            Stage::Dispatch => 20,
            Stage::Aggregated => 50,
            Stage::BrowserAudio => 60,
            Stage::Synthesis => 70,
            Stage::Resources => 80,
            Stage::Suggestions => 90,
        }
    }

    fn step(self) -> &'static str {
        match self {
            Stage::Outline => "Generating course outline...",
            Stage::OutlineReady => "Outline ready",
            Stage::Dispatch => "Generating content in parallel...",
            Stage::Aggregated => "Content generated",
            Stage::BrowserAudio => "Audio scripts saved",
            Stage::Synthesis => "Audio ready",
            Stage::Resources => "Finding resources...",
            Stage::Suggestions => "Generating suggestions...",
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    pub chapters: usize,
    pub flashcards: usize,
    pub mcqs: usize,
    pub articles: usize,
    pub word_games: usize,
    pub audio_generated: bool,
    pub resources: usize,
    pub suggestions: usize,
    pub duration_seconds: i64,
}

/// A course and job created and ready for the background run.
#[derive(Debug, Clone, Copy)]
pub struct StartedJob {
    pub course_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Clone)]
pub struct CourseOrchestrator {
    llm: LlmClient,
    store: Arc<dyn RecordStore>,
    tts: Option<TtsClient>,
    audio_storage: Option<Arc<dyn AudioStorage>>,
    search: Option<SearchClient>,
}

impl CourseOrchestrator {
    pub fn new(llm: LlmClient, store: Arc<dyn RecordStore>) -> Self {
        Self {
            llm,
            store,
            tts: None,
            audio_storage: None,
            search: None,
        }
    }

    /// Enables speech synthesis into `storage`.
    pub fn with_tts(mut self, tts: TtsClient, storage: Arc<dyn AudioStorage>) -> Self {
        self.tts = Some(tts);
        self.audio_storage = Some(storage);
        self
    }

    pub fn with_search(mut self, search: SearchClient) -> Self {
        self.search = Some(search);
        self
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    pub fn tts_enabled(&self) -> bool {
        self.tts.is_some() && self.audio_storage.is_some()
    }

    pub fn search_enabled(&self) -> bool {
        self.search.is_some()
    }

    /// Validates the request, creates the course and its job, and spawns the
    /// run in the background. Returns as soon as both rows exist.
    pub async fn start(&self, user_id: Uuid, topic: &str) -> Result<StartedJob, AppError> {
        let started = self.prepare(user_id, topic).await?;

        let orchestrator = self.clone();
        let topic = topic.trim().to_string();
        let span = info_span!("course_generation", course_id = %started.course_id);
        tokio::spawn(
            async move {
                // Failures are already recorded on the job row.
                let _ = orchestrator.run(started.course_id, &topic).await;
            }
            .instrument(span),
        );

        Ok(started)
    }

    pub(crate) async fn prepare(&self, user_id: Uuid, topic: &str) -> Result<StartedJob, AppError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::Validation("topic must not be empty".to_string()));
        }
        if !self.llm.has_keys(ServiceCategory::Chapter) {
            return Err(AppError::Configuration(
                "no text-generation credentials configured".to_string(),
            ));
        }

        let store = self.store.as_ref();
        let course_id = create_course(store, &CourseRow::new(user_id, topic)).await?;
        let job_id = create_job(store, &GenerationJobRow::new(course_id, user_id)).await?;

        info!(course_id = %course_id, job_id = %job_id, topic, "Course generation queued");
        Ok(StartedJob { course_id, job_id })
    }

    /// Runs the whole pipeline for an existing course. On failure the job is
    /// marked failed before the error is returned.
    pub async fn run(&self, course_id: Uuid, topic: &str) -> Result<GenerationSummary, PipelineError> {
        match self.execute(course_id, topic).await {
            Ok(summary) => {
                info!(
                    course_id = %course_id,
                    duration_seconds = summary.duration_seconds,
                    audio_generated = summary.audio_generated,
                    resources = summary.resources,
                    suggestions = summary.suggestions,
                    "Course published"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(course_id = %course_id, "Course generation failed: {e}");
                if let Err(write_err) = update_job(self.store.as_ref(), course_id, JobPatch::failed(e.to_string())).await {
                    error!(course_id = %course_id, "Could not mark job failed: {write_err}");
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, course_id: Uuid, topic: &str) -> Result<GenerationSummary, PipelineError> {
        let started = Instant::now();
        let store = self.store.as_ref();
        let llm = &self.llm;

        self.milestone(course_id, Stage::Outline).await?;
        let outline = generate_outline(llm, topic).await.map_err(PipelineError::Outline)?;
        info!(course_id = %course_id, chapters = outline.chapters.len(), "Outline generated");
        self.milestone(course_id, Stage::OutlineReady).await?;

        self.milestone(course_id, Stage::Dispatch).await?;
        let (chapters, flashcards, mcqs, articles, word_games, scripts) = tokio::join!(
            generate_chapters(llm, store, course_id, topic, &outline),
            generate_flashcards(llm, store, course_id, topic),
            generate_mcqs(llm, store, course_id, topic),
            generate_articles(llm, store, course_id, topic),
            generate_word_games(llm, store, course_id, topic),
            generate_audio_scripts(llm, topic, &outline),
        );

        let mut summary = GenerationSummary {
            chapters: settle("chapters", chapters),
            flashcards: settle("flashcards", flashcards),
            mcqs: settle("mcqs", mcqs),
            articles: settle("articles", articles),
            word_games: settle("word games", word_games),
            ..GenerationSummary::default()
        };
        update_job(
            store,
            course_id,
            JobPatch::progress(
                Stage::Aggregated.progress(),
                format!(
                    "{}: {} chapters, {} flashcards, {} MCQs, {} articles, {} word games",
                    Stage::Aggregated.step(),
                    summary.chapters,
                    summary.flashcards,
                    summary.mcqs,
                    summary.articles,
                    summary.word_games
                ),
            ),
        )
        .await?;

        if let Err(e) = persist_browser_audio(store, course_id, &scripts).await {
            warn!(course_id = %course_id, "Browser audio rows not stored: {e}");
        }
        self.milestone(course_id, Stage::BrowserAudio).await?;

        summary.audio_generated = match (&self.tts, &self.audio_storage) {
            (Some(tts), Some(storage)) => {
                let (short_ok, long_ok) = tokio::join!(
                    synthesize_audio(tts, storage.as_ref(), store, course_id, AudioType::ShortPodcast, &scripts.short),
                    synthesize_audio(tts, storage.as_ref(), store, course_id, AudioType::FullLecture, &scripts.long),
                );
                info!(course_id = %course_id, short_ok, long_ok, "Speech synthesis finished");
                tts_audio_present(store, course_id).await.unwrap_or_else(|e| {
                    warn!(course_id = %course_id, "Could not verify synthesized audio: {e}");
                    false
                })
            }
            _ => false,
        };
        self.milestone(course_id, Stage::Synthesis).await?;

        self.milestone(course_id, Stage::Resources).await?;
        if let Some(search) = &self.search {
            summary.resources = settle("resources", find_resources(search, store, course_id, topic).await);
        }

        self.milestone(course_id, Stage::Suggestions).await?;
        summary.suggestions = settle("suggestions", generate_suggestions(llm, store, course_id, topic).await);

        summary.duration_seconds = started.elapsed().as_secs() as i64;
        update_course(
            store,
            course_id,
            CoursePatch {
                status: Some(CourseStatus::Published),
                audio_generated: Some(summary.audio_generated),
                articles_generated: Some(summary.articles > 0),
                games_generated: Some(summary.word_games > 0),
                generation_duration_seconds: Some(summary.duration_seconds),
                completion_time_estimate: Some(format!(
                    "{} minutes",
                    outline.chapters.len() * MINUTES_PER_CHAPTER
                )),
            },
        )
        .await?;
        update_job(store, course_id, JobPatch::completed()).await?;

        Ok(summary)
    }

    async fn milestone(&self, course_id: Uuid, stage: Stage) -> Result<(), StoreError> {
        update_job(
            self.store.as_ref(),
            course_id,
            JobPatch::progress(stage.progress(), stage.step()),
        )
        .await
    }
}

/// Collapses a non-fatal generator result to its row count.
fn settle(what: &str, result: Result<usize, GenerationError>) -> usize {
    match result {
        Ok(count) => count,
        Err(e) => {
            warn!(generator = what, "Generator failed, continuing without it: {e}");
            0
        }
    }
}
