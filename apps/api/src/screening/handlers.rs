use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        multipart::Field,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::batch::{run_batch, BatchItem, BatchOptions, ItemError, ItemOutcome, CANCELLED_CODE};
use crate::screening::models::{AtsResult, CandidateProfile, JobAnalysisSummary, JobProfile};
use crate::screening::pipeline::{
    analyze_job_description, analyze_job_description_file, evaluate_resume, Evaluation,
    ResumeUpload,
};
use crate::screening::repository::{self, ListScreeningsQuery, ScreeningPage, ScreeningRecord};
use crate::screening::scoring;
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id set by the request-id layer. Falls back to a fresh UUID when the
/// router runs without it.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart forms
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ScreeningForm {
    job_text: Option<String>,
    job_file: Option<(String, Bytes)>,
    resumes: Vec<ResumeUpload>,
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart upload: {}", err.body_text()))
}

async fn read_file(field: Field<'_>) -> Result<(String, Bytes), AppError> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("Uploaded file has no filename".to_string()))?;
    let data = field.bytes().await.map_err(multipart_error)?;
    Ok((filename, data))
}

fn too_many_resumes(max_resumes: usize) -> AppError {
    if max_resumes == 1 {
        AppError::Validation("Upload exactly one resume; use the batch endpoint for several".to_string())
    } else {
        AppError::Validation(format!("A batch accepts at most {max_resumes} resumes"))
    }
}

/// Stops at the first resume field past `max_resumes`, before its body is buffered.
async fn read_form(multipart: &mut Multipart, max_resumes: usize) -> Result<ScreeningForm, AppError> {
    let mut form = ScreeningForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("job_description") => {
                form.job_text = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("job_description_file") => {
                form.job_file = Some(read_file(field).await?);
            }
            Some("resume") | Some("resumes") => {
                if form.resumes.len() >= max_resumes {
                    return Err(too_many_resumes(max_resumes));
                }
                let (filename, data) = read_file(field).await?;
                form.resumes.push(ResumeUpload { filename, data });
            }
            _ => {}
        }
    }
    Ok(form)
}

/// The uploaded file wins over the text field when both are present.
async fn resolve_job(
    state: &AppState,
    job_text: Option<String>,
    job_file: Option<(String, Bytes)>,
) -> Result<(JobProfile, String), AppError> {
    match (job_file, job_text) {
        (Some((filename, data)), _) => {
            analyze_job_description_file(
                state.extractor.as_ref(),
                &filename,
                data,
                state.config.max_upload_bytes,
            )
            .await
        }
        (None, Some(text)) => {
            let job = analyze_job_description(state.extractor.as_ref(), &text).await?;
            Ok((job, text.trim().to_string()))
        }
        (None, None) => Err(AppError::Validation(
            "Provide a job description as 'job_description' text or a 'job_description_file' upload"
                .to_string(),
        )),
    }
}

/// Best-effort. Returns whether the rows were written.
async fn record(
    state: &AppState,
    request_id: &str,
    job_text: &str,
    job: &JobProfile,
    evaluations: &[&Evaluation],
) -> bool {
    let Some(pool) = state.db.as_ref() else {
        return false;
    };
    if evaluations.is_empty() {
        return false;
    }
    match repository::save_screenings(
        pool,
        state.archive.as_ref(),
        request_id,
        job_text,
        job,
        evaluations,
    )
    .await
    {
        Ok(()) => true,
        Err(e) => {
            error!(request_id, error = %e, "Failed to persist screenings");
            false
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Single evaluation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EvaluateResponse {
    pub request_id: String,
    pub evaluation_id: Uuid,
    pub filename: String,
    pub result: AtsResult,
    pub candidate_profile: CandidateProfile,
    pub job_profile: JobProfile,
    pub persisted: bool,
}

/// POST /api/v1/screenings/evaluate
pub async fn handle_evaluate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<EvaluateResponse>, AppError> {
    let request_id = request_id(&headers);
    let form = read_form(&mut multipart, 1).await?;

    let Some(upload) = form.resumes.into_iter().next() else {
        return Err(AppError::Validation("Upload a resume in the 'resume' field".to_string()));
    };

    let (job, job_text) = resolve_job(&state, form.job_text, form.job_file).await?;
    let evaluation = evaluate_resume(
        state.extractor.as_ref(),
        &job,
        upload,
        state.config.max_upload_bytes,
        &request_id,
    )
    .await?;

    let persisted = record(&state, &request_id, &job_text, &job, &[&evaluation]).await;

    Ok(Json(EvaluateResponse {
        request_id,
        evaluation_id: evaluation.evaluation_id,
        filename: evaluation.filename,
        result: evaluation.result,
        candidate_profile: evaluation.candidate,
        job_profile: job,
        persisted,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Batch
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BatchItemResponse {
    pub index: usize,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AtsResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

impl From<BatchItem> for BatchItemResponse {
    fn from(item: BatchItem) -> Self {
        let (evaluation_id, result, error) = match item.outcome {
            ItemOutcome::Evaluated(e) => (Some(e.evaluation_id), Some(e.result), None),
            ItemOutcome::Failed(err) => (None, None, Some(err)),
            ItemOutcome::Cancelled => (
                None,
                None,
                Some(ItemError {
                    code: CANCELLED_CODE.to_string(),
                    message: "The batch stopped before this resume was evaluated".to_string(),
                }),
            ),
        };
        Self {
            index: item.index,
            filename: item.filename,
            rank: item.rank,
            evaluation_id,
            result,
            error,
        }
    }
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub request_id: String,
    pub job_profile: JobProfile,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub persisted: bool,
    pub items: Vec<BatchItemResponse>,
}

/// Flips the batch cancel flag when the request future is dropped (client went away).
struct CancelOnDrop(watch::Sender<bool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

/// POST /api/v1/screenings/batch
pub async fn handle_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, AppError> {
    let request_id = request_id(&headers);
    let form = read_form(&mut multipart, state.config.batch_max_files).await?;

    if form.resumes.is_empty() {
        return Err(AppError::Validation(
            "Upload at least one resume in the 'resumes' field".to_string(),
        ));
    }

    // Extracted once and shared read-only by every item.
    let (job, job_text) = resolve_job(&state, form.job_text, form.job_file).await?;
    let job = Arc::new(job);

    let options = BatchOptions {
        concurrency: state.config.batch_concurrency,
        deadline: Duration::from_secs(state.config.batch_deadline_secs),
        max_upload_bytes: state.config.max_upload_bytes,
    };
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let _cancel_guard = CancelOnDrop(cancel_tx);

    info!(
        request_id = %request_id,
        resumes = form.resumes.len(),
        concurrency = options.concurrency,
        "Batch started"
    );

    // Detached so in-flight items and their persistence finish even if the client disconnects.
    let task_state = state.clone();
    let task_job = Arc::clone(&job);
    let task_request_id = request_id.clone();
    let resumes = form.resumes;
    let handle = tokio::spawn(
        async move {
            let report = run_batch(
                Arc::clone(&task_state.extractor),
                Arc::clone(&task_job),
                resumes,
                options,
                &task_request_id,
                cancel_rx,
            )
            .await;
            let evaluations: Vec<&Evaluation> = report
                .items
                .iter()
                .filter_map(|item| match &item.outcome {
                    ItemOutcome::Evaluated(e) => Some(e),
                    _ => None,
                })
                .collect();
            let persisted =
                record(&task_state, &task_request_id, &job_text, &task_job, &evaluations).await;
            (report, persisted)
        }
        .instrument(tracing::Span::current()),
    );

    let (report, persisted) = handle
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("batch task failed: {e}")))?;

    info!(
        request_id = %request_id,
        succeeded = report.succeeded,
        failed = report.failed,
        cancelled = report.cancelled,
        "Batch finished"
    );

    let total = report.total();
    Ok(Json(BatchResponse {
        request_id,
        job_profile: (*job).clone(),
        total,
        succeeded: report.succeeded,
        failed: report.failed,
        cancelled: report.cancelled,
        persisted,
        items: report.items.into_iter().map(BatchItemResponse::from).collect(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring and lookup
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub candidate: CandidateProfile,
    #[serde(default)]
    pub job: JobProfile,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    pub request_id: String,
    pub result: AtsResult,
}

/// POST /api/v1/screenings/score
/// Scores already-structured profiles. No extraction, no persistence.
pub async fn handle_score(
    headers: HeaderMap,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let result = scoring::score(&req.candidate.sanitized(), &req.job.sanitized())?;
    Ok(Json(ScoreResponse {
        request_id: request_id(&headers),
        result,
    }))
}

fn require_db(state: &AppState) -> Result<&sqlx::PgPool, AppError> {
    state.db.as_ref().ok_or_else(|| {
        AppError::Unavailable("Screening persistence is not configured".to_string())
    })
}

/// GET /api/v1/screenings
pub async fn handle_list_screenings(
    State(state): State<AppState>,
    query: Result<Query<ListScreeningsQuery>, QueryRejection>,
) -> Result<Json<ScreeningPage>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let pool = require_db(&state)?;
    Ok(Json(repository::list_screenings(pool, &query).await?))
}

/// GET /api/v1/screenings/:id
pub async fn handle_get_screening(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScreeningRecord>, AppError> {
    let pool = require_db(&state)?;
    Ok(Json(repository::get_screening(pool, id).await?))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub id: Uuid,
    pub deleted: bool,
}

/// DELETE /api/v1/screenings/:id
pub async fn handle_delete_screening(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let pool = require_db(&state)?;
    repository::delete_screening(pool, state.archive.as_ref(), id).await?;
    Ok(Json(DeleteResponse { id, deleted: true }))
}

/// POST /api/v1/screenings/:id/rescore
/// Scores the archived resume of a stored screening against a new job description.
pub async fn handle_rescore_screening(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let request_id = request_id(&headers);
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let pool = require_db(&state)?;
    let archive = state.archive.as_ref().ok_or_else(|| {
        AppError::Unavailable("Resume archiving is not configured".to_string())
    })?;

    let (filename, data) = repository::load_archived_resume(pool, archive, id).await?;
    let job = analyze_job_description(state.extractor.as_ref(), &req.job_description).await?;
    let evaluation = evaluate_resume(
        state.extractor.as_ref(),
        &job,
        ResumeUpload { filename, data },
        state.config.max_upload_bytes,
        &request_id,
    )
    .await?;
    info!(request_id = %request_id, source = %id, "Stored resume re-scored");

    let job_text = req.job_description.trim();
    let persisted = record(&state, &request_id, job_text, &job, &[&evaluation]).await;

    Ok(Json(EvaluateResponse {
        request_id,
        evaluation_id: evaluation.evaluation_id,
        filename: evaluation.filename,
        result: evaluation.result,
        candidate_profile: evaluation.candidate,
        job_profile: job,
        persisted,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Job description analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub job_description: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub request_id: String,
    pub job_profile: JobProfile,
    pub analysis_summary: JobAnalysisSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

/// POST /api/v1/job-descriptions/analyze
pub async fn handle_analyze_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let job = analyze_job_description(state.extractor.as_ref(), &req.job_description).await?;
    Ok(Json(AnalyzeResponse {
        request_id: request_id(&headers),
        analysis_summary: job.analysis_summary(),
        job_profile: job,
        extracted_text: None,
    }))
}

/// POST /api/v1/job-descriptions/analyze-file
pub async fn handle_analyze_job_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let is_file = field.name() == Some("file");
        if is_file {
            upload = Some(read_file(field).await?);
        }
    }
    let (filename, data) = upload
        .ok_or_else(|| AppError::Validation("Upload the job description in the 'file' field".to_string()))?;

    let (job, text) = analyze_job_description_file(
        state.extractor.as_ref(),
        &filename,
        data,
        state.config.max_upload_bytes,
    )
    .await?;

    Ok(Json(AnalyzeResponse {
        request_id: request_id(&headers),
        analysis_summary: job.analysis_summary(),
        job_profile: job,
        extracted_text: Some(text),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-123"));
        assert_eq!(request_id(&headers), "req-123");
    }

    #[test]
    fn test_request_id_generated_when_missing() {
        let id = request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_cancelled_item_serializes_with_code() {
        let item = BatchItem {
            index: 3,
            filename: "late.pdf".to_string(),
            rank: None,
            outcome: ItemOutcome::Cancelled,
        };
        let json = serde_json::to_value(BatchItemResponse::from(item)).unwrap();
        assert_eq!(json["error"]["code"], "CANCELLED");
        assert_eq!(json["index"], 3);
        assert!(json.get("rank").is_none());
        assert!(json.get("result").is_none());
    }
}
