//! Axum route handlers for the Course API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::orchestrator::ESTIMATED_SECONDS;
use crate::state::AppState;
use crate::store::{course_rows, Filter, Order, RecordStore, Table};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCourseRequest {
    pub topic: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCourseResponse {
    pub success: bool,
    pub course_id: Uuid,
    pub job_id: Uuid,
    pub estimated_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// Everything generated for a course, one list per content table.
#[derive(Debug, Serialize)]
pub struct CourseContentResponse {
    pub course: Value,
    pub chapters: Vec<Value>,
    pub flashcards: Vec<Value>,
    pub mcqs: Vec<Value>,
    pub articles: Vec<Value>,
    pub word_games: Vec<Value>,
    pub audio: Vec<Value>,
    pub resources: Vec<Value>,
    pub suggestions: Vec<Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/courses/generate
///
/// Creates the course and job rows, starts generation in the background and
/// returns immediately. Poll `/api/v1/courses/:id/job` for progress.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateCourseRequest>,
) -> Result<Json<GenerateCourseResponse>, AppError> {
    let started = state
        .orchestrator
        .start(request.user_id, &request.topic)
        .await?;

    Ok(Json(GenerateCourseResponse {
        success: true,
        course_id: started.course_id,
        job_id: started.job_id,
        estimated_seconds: ESTIMATED_SECONDS,
    }))
}

/// GET /api/v1/courses?user_id=
/// Bare array of the user's courses, newest first.
pub async fn handle_list_courses(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let courses = state
        .store
        .select(
            Table::Courses,
            &Filter::eq("user_id", params.user_id),
            Some(Order::desc("created_at")),
        )
        .await?;
    Ok(Json(courses))
}

/// GET /api/v1/courses/:id
pub async fn handle_get_course(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(find_course(state.store.as_ref(), course_id).await?))
}

/// GET /api/v1/courses/:id/content
pub async fn handle_get_content(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseContentResponse>, AppError> {
    let store = state.store.as_ref();
    let course = find_course(store, course_id).await?;

    let (chapters, flashcards, mcqs, articles, word_games, audio, resources, suggestions) = tokio::try_join!(
        course_rows(store, Table::Chapters, course_id, Some(Order::asc("order_number"))),
        course_rows(store, Table::Flashcards, course_id, None),
        course_rows(store, Table::Mcqs, course_id, None),
        course_rows(store, Table::Articles, course_id, None),
        course_rows(store, Table::WordGames, course_id, None),
        course_rows(store, Table::Audio, course_id, None),
        course_rows(store, Table::Resources, course_id, None),
        course_rows(
            store,
            Table::Suggestions,
            course_id,
            Some(Order::desc("relevance_score"))
        ),
    )?;

    Ok(Json(CourseContentResponse {
        course,
        chapters,
        flashcards,
        mcqs,
        articles,
        word_games,
        audio,
        resources,
        suggestions,
    }))
}

/// GET /api/v1/courses/:id/job
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    course_rows(state.store.as_ref(), Table::GenerationJobs, course_id, None)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No generation job for course {course_id}")))
}

async fn find_course(store: &dyn RecordStore, course_id: Uuid) -> Result<Value, AppError> {
    store
        .select(Table::Courses, &Filter::eq("id", course_id), None)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Course {course_id} not found")))
}
