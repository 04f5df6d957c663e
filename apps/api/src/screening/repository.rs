use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::screening::{JobDescriptionRow, ResumeRow, ScreeningResultRow};
use crate::screening::models::{JobProfile, ScreeningStatus};
use crate::screening::pipeline::Evaluation;

/// Uploaded resumes in object storage, one object per evaluation.
#[derive(Clone)]
pub struct ResumeArchive {
    client: S3Client,
    bucket: String,
}

impl ResumeArchive {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub async fn put(&self, resume_id: Uuid, filename: &str, data: Bytes) -> anyhow::Result<String> {
        let key = object_key(resume_id, filename);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Archived resume to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Bytes> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 download failed: {e}"))?;
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| anyhow::anyhow!("S3 body read failed: {e}"))?;
        Ok(data.into_bytes())
    }

    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 delete failed: {e}"))?;

        info!("Removed resume s3://{}/{}", self.bucket, key);
        Ok(())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 bucket check failed: {e}"))?;
        Ok(())
    }
}

/// `resumes/{id}/{filename}` with anything outside `[A-Za-z0-9._-]` replaced.
pub fn object_key(resume_id: Uuid, filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("resumes/{resume_id}/{safe}")
}

/// Writes the job description once, then one resume row and one result row per evaluation.
/// Archive failures only leave `s3_key` empty.
pub async fn save_screenings(
    pool: &PgPool,
    archive: Option<&ResumeArchive>,
    request_id: &str,
    job_text: &str,
    job: &JobProfile,
    evaluations: &[&Evaluation],
) -> Result<(), AppError> {
    let job_json = serde_json::to_value(job).map_err(anyhow::Error::from)?;

    let mut s3_keys = Vec::with_capacity(evaluations.len());
    for evaluation in evaluations {
        let key = match archive {
            Some(archive) => archive
                .put(evaluation.evaluation_id, &evaluation.filename, evaluation.upload.clone())
                .await
                .map_err(|e| warn!(filename = %evaluation.filename, error = %e, "Resume archiving failed"))
                .ok(),
            None => None,
        };
        s3_keys.push(key);
    }

    let mut tx = pool.begin().await?;

    let job_description_id = Uuid::new_v4();
    sqlx::query("INSERT INTO job_descriptions (id, raw_text, profile) VALUES ($1, $2, $3)")
        .bind(job_description_id)
        .bind(job_text)
        .bind(&job_json)
        .execute(&mut *tx)
        .await?;

    for (evaluation, s3_key) in evaluations.iter().zip(s3_keys) {
        // The evaluation id doubles as the resume id.
        let resume_id = evaluation.evaluation_id;
        sqlx::query("INSERT INTO resumes (id, filename, s3_key) VALUES ($1, $2, $3)")
            .bind(resume_id)
            .bind(&evaluation.filename)
            .bind(s3_key)
            .execute(&mut *tx)
            .await?;

        let result = &evaluation.result;
        let result_json = serde_json::to_value(result).map_err(anyhow::Error::from)?;
        sqlx::query(
            r#"
            INSERT INTO screening_results
                (id, request_id, job_description_id, resume_id, filename, final_score,
                 status, shortlisted, matched_skills, missing_skills, result)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(evaluation.evaluation_id)
        .bind(request_id)
        .bind(job_description_id)
        .bind(resume_id)
        .bind(&evaluation.filename)
        .bind(result.final_score)
        .bind(result.status.as_str())
        .bind(result.status == ScreeningStatus::Shortlisted)
        .bind(&result.score_breakdown.matched_skills)
        .bind(&result.score_breakdown.missing_skills)
        .bind(&result_json)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        request_id,
        %job_description_id,
        count = evaluations.len(),
        "Screenings persisted"
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ScreeningRecord {
    pub screening: ScreeningResultRow,
    pub job_description: Option<JobDescriptionRow>,
    pub resume: Option<ResumeRow>,
}

pub async fn get_screening(pool: &PgPool, id: Uuid) -> Result<ScreeningRecord, AppError> {
    let screening: ScreeningResultRow =
        sqlx::query_as("SELECT * FROM screening_results WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Screening {id} not found")))?;

    let job_description: Option<JobDescriptionRow> =
        sqlx::query_as("SELECT * FROM job_descriptions WHERE id = $1")
            .bind(screening.job_description_id)
            .fetch_optional(pool)
            .await?;

    let resume: Option<ResumeRow> = sqlx::query_as("SELECT * FROM resumes WHERE id = $1")
        .bind(screening.resume_id)
        .fetch_optional(pool)
        .await?;

    Ok(ScreeningRecord {
        screening,
        job_description,
        resume,
    })
}

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListScreeningsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<ScreeningStatus>,
}

impl ListScreeningsQuery {
    /// (page, page_size, offset) with page ≥ 1 and page_size in 1..=100.
    fn bounds(&self) -> (u32, u32, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(page_size);
        (page, page_size, offset)
    }
}

#[derive(Debug, Serialize)]
pub struct ScreeningPage {
    pub screenings: Vec<ScreeningResultRow>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: u32,
}

fn total_pages(total_count: i64, page_size: u32) -> u32 {
    let size = i64::from(page_size.max(1));
    u32::try_from((total_count.max(0) + size - 1) / size).unwrap_or(u32::MAX)
}

/// Newest first, optionally filtered by status.
pub async fn list_screenings(
    pool: &PgPool,
    query: &ListScreeningsQuery,
) -> Result<ScreeningPage, AppError> {
    let (page, page_size, offset) = query.bounds();
    let status = query.status.map(|s| s.as_str());

    let total_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM screening_results WHERE ($1::text IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(pool)
    .await?;

    let screenings: Vec<ScreeningResultRow> = sqlx::query_as(
        r#"
        SELECT * FROM screening_results
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status)
    .bind(i64::from(page_size))
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(ScreeningPage {
        screenings,
        page,
        page_size,
        total_count,
        total_pages: total_pages(total_count, page_size),
    })
}

/// Removes the result, its resume row and, once nothing references it, the job description.
/// The archived upload is removed after the rows; a failed object delete is only logged.
pub async fn delete_screening(
    pool: &PgPool,
    archive: Option<&ResumeArchive>,
    id: Uuid,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let screening: ScreeningResultRow =
        sqlx::query_as("DELETE FROM screening_results WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Screening {id} not found")))?;

    let s3_key: Option<Option<String>> =
        sqlx::query_scalar("DELETE FROM resumes WHERE id = $1 RETURNING s3_key")
            .bind(screening.resume_id)
            .fetch_optional(&mut *tx)
            .await?;

    sqlx::query(
        r#"
        DELETE FROM job_descriptions
        WHERE id = $1
          AND NOT EXISTS (SELECT 1 FROM screening_results WHERE job_description_id = $1)
        "#,
    )
    .bind(screening.job_description_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(%id, request_id = %screening.request_id, "Screening deleted");

    if let (Some(archive), Some(key)) = (archive, s3_key.flatten()) {
        if let Err(e) = archive.delete(&key).await {
            warn!(%id, key = %key, error = %e, "Archived resume could not be removed");
        }
    }
    Ok(())
}

/// Filename and archived bytes of the resume behind a stored screening.
pub async fn load_archived_resume(
    pool: &PgPool,
    archive: &ResumeArchive,
    id: Uuid,
) -> Result<(String, Bytes), AppError> {
    let resume: ResumeRow = sqlx::query_as(
        r#"
        SELECT r.* FROM resumes r
        JOIN screening_results s ON s.resume_id = r.id
        WHERE s.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Screening {id} not found")))?;

    let key = resume.s3_key.ok_or_else(|| {
        AppError::NotFound(format!("The resume behind screening {id} was not archived"))
    })?;
    let data = archive.get(&key).await.map_err(|e| {
        AppError::Unavailable(format!("Archived resume could not be read: {e}"))
    })?;
    Ok((resume.filename, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_sanitizes_filename() {
        let id = Uuid::nil();
        assert_eq!(
            object_key(id, "Jane Doe (CV)/v2.pdf"),
            "resumes/00000000-0000-0000-0000-000000000000/Jane_Doe__CV__v2.pdf"
        );
        assert_eq!(
            object_key(id, "cv-final_1.docx"),
            "resumes/00000000-0000-0000-0000-000000000000/cv-final_1.docx"
        );
    }

    #[test]
    fn test_list_query_bounds() {
        assert_eq!(ListScreeningsQuery::default().bounds(), (1, 20, 0));

        let query = ListScreeningsQuery {
            page: Some(0),
            page_size: Some(500),
            status: None,
        };
        assert_eq!(query.bounds(), (1, 100, 0));

        let query = ListScreeningsQuery {
            page: Some(3),
            page_size: Some(0),
            status: None,
        };
        assert_eq!(query.bounds(), (3, 1, 2));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }
}
