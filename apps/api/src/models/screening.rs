use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Row of `screening_results`. `result` holds the full serialized `AtsResult`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScreeningResultRow {
    pub id: Uuid,
    pub request_id: String,
    pub job_description_id: Uuid,
    pub resume_id: Uuid,
    pub filename: String,
    pub final_score: f64,
    pub status: String,
    pub shortlisted: bool,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub result: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDescriptionRow {
    pub id: Uuid,
    pub raw_text: String,
    pub profile: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub filename: String,
    pub s3_key: Option<String>,
    pub created_at: DateTime<Utc>,
}
