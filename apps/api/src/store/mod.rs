//! Record store. The narrow persistence contract the pipeline depends on.
//!
//! Rows travel as JSON objects so one trait covers both the Supabase REST
//! backend and the direct Postgres backend. Typed helpers at the bottom of
//! this module are what the rest of the crate calls.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::course::{CoursePatch, CourseRow, GenerationJobRow, JobPatch};

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod supabase;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Record store returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Courses,
    GenerationJobs,
    Chapters,
    Flashcards,
    Mcqs,
    Articles,
    WordGames,
    Audio,
    Resources,
    Suggestions,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Courses => "courses",
            Table::GenerationJobs => "course_generation_jobs",
            Table::Chapters => "course_chapters",
            Table::Flashcards => "course_flashcards",
            Table::Mcqs => "course_mcqs",
            Table::Articles => "course_articles",
            Table::WordGames => "course_word_games",
            Table::Audio => "course_audio",
            Table::Resources => "course_resources",
            Table::Suggestions => "course_suggestions",
        }
    }
}

/// Conjunction of `column = value` conditions.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self::default().and_eq(column, value)
    }

    pub fn and_eq(mut self, column: &str, value: impl ToString) -> Self {
        self.conditions.push((column.to_string(), value.to_string()));
        self
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts `rows` and returns them as stored.
    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError>;

    /// Applies `fields` to every row matching `filter`.
    async fn patch(&self, table: Table, filter: &Filter, fields: Value) -> Result<(), StoreError>;

    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn exists(&self, table: Table, filter: &Filter) -> Result<bool, StoreError> {
        Ok(!self.select(table, filter, None).await?.is_empty())
    }

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Column names are interpolated into SQL and query strings, so only plain
/// identifiers are accepted.
pub(crate) fn validate_column(column: &str) -> Result<&str, StoreError> {
    let valid = !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(column)
    } else {
        Err(StoreError::InvalidColumn(column.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Typed helpers
// ────────────────────────────────────────────────────────────────────────────

pub async fn insert_rows<T: Serialize>(
    store: &dyn RecordStore,
    table: Table,
    rows: &[T],
) -> Result<(), StoreError> {
    if rows.is_empty() {
        return Ok(());
    }
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    store.insert_many(table, values).await?;
    Ok(())
}

pub async fn create_course(store: &dyn RecordStore, course: &CourseRow) -> Result<Uuid, StoreError> {
    let stored = store
        .insert_many(Table::Courses, vec![serde_json::to_value(course)?])
        .await?;
    Ok(returned_id(&stored).unwrap_or(course.id))
}

pub async fn create_job(store: &dyn RecordStore, job: &GenerationJobRow) -> Result<Uuid, StoreError> {
    let stored = store
        .insert_many(Table::GenerationJobs, vec![serde_json::to_value(job)?])
        .await?;
    Ok(returned_id(&stored).unwrap_or(job.id))
}

/// The id the backend reports for the first stored row, if it echoed one.
fn returned_id(stored: &[Value]) -> Option<Uuid> {
    stored
        .first()
        .and_then(|row| row.get("id"))
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
}

pub async fn update_job(store: &dyn RecordStore, course_id: Uuid, patch: JobPatch) -> Result<(), StoreError> {
    store
        .patch(
            Table::GenerationJobs,
            &Filter::eq("course_id", course_id),
            serde_json::to_value(patch)?,
        )
        .await
}

pub async fn update_course(store: &dyn RecordStore, course_id: Uuid, patch: CoursePatch) -> Result<(), StoreError> {
    store
        .patch(
            Table::Courses,
            &Filter::eq("id", course_id),
            serde_json::to_value(patch)?,
        )
        .await
}

/// All rows of `table` belonging to `course_id`.
pub async fn course_rows(
    store: &dyn RecordStore,
    table: Table,
    course_id: Uuid,
    order: Option<Order>,
) -> Result<Vec<Value>, StoreError> {
    store
        .select(table, &Filter::eq("course_id", course_id), order)
        .await
}
