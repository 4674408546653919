use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Generating,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub summary: String,
    pub purpose: String,
    pub difficulty: String,
    pub status: CourseStatus,
    pub audio_generated: bool,
    pub articles_generated: bool,
    pub games_generated: bool,
    pub generation_duration_seconds: Option<i64>,
    pub completion_time_estimate: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CourseRow {
    pub fn new(user_id: Uuid, topic: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: topic.to_string(),
            summary: format!("AI-generated course on {topic}"),
            purpose: "practice".to_string(),
            difficulty: "intermediate".to_string(),
            status: CourseStatus::Generating,
            audio_generated: false,
            articles_generated: false,
            games_generated: false,
            generation_duration_seconds: None,
            completion_time_estimate: None,
            created_at: Utc::now(),
        }
    }
}

/// Progress record polled by clients while a course is generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJobRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub job_type: String,
    pub status: JobStatus,
    pub progress_percentage: i32,
    pub current_step: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationJobRow {
    pub fn new(course_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            user_id,
            job_type: "course_creation".to_string(),
            status: JobStatus::Processing,
            progress_percentage: 5,
            current_step: "Starting parallel generation".to_string(),
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Partial update of a job row. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobPatch {
    pub fn progress(percentage: i32, step: impl Into<String>) -> Self {
        Self {
            progress_percentage: Some(percentage),
            current_step: Some(step.into()),
            ..Self::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress_percentage: Some(100),
            current_step: Some("Course ready!".to_string()),
            completed_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            current_step: Some("Generation failed".to_string()),
            error_message: Some(message.into()),
            completed_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}

/// Partial update of a course row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoursePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CourseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_generated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub articles_generated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub games_generated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_time_estimate: Option<String>,
}
