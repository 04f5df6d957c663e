//! One evaluation end to end: document → text → validation → profile → score.
//!
//! Single and batch evaluation both go through `evaluate_resume`, so a resume scores the
//! same whether it is uploaded alone or among others.

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::document::extract_text;
use crate::extraction::validation::{validate_job_description, validate_resume_text};
use crate::extraction::ProfileExtractor;
use crate::screening::models::{AtsResult, CandidateProfile, JobProfile};
use crate::screening::scoring;

/// An uploaded resume, still undecoded.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub evaluation_id: Uuid,
    pub filename: String,
    pub candidate: CandidateProfile,
    pub result: AtsResult,
    /// Kept for archiving.
    pub upload: Bytes,
}

pub async fn evaluate_resume(
    extractor: &dyn ProfileExtractor,
    job: &JobProfile,
    upload: ResumeUpload,
    max_upload_bytes: usize,
    request_id: &str,
) -> Result<Evaluation, AppError> {
    let ResumeUpload { filename, data } = upload;

    let text = extract_text(&filename, data.clone(), max_upload_bytes).await?;
    validate_resume_text(&filename, &text)?;

    let candidate = extractor.extract_candidate(&text).await?;
    let result = scoring::score(&candidate, job)?;

    let evaluation_id = Uuid::new_v4();
    info!(
        request_id,
        %evaluation_id,
        filename = %filename,
        final_score = result.final_score,
        status = result.status.as_str(),
        "Resume evaluated"
    );

    Ok(Evaluation {
        evaluation_id,
        filename,
        candidate,
        result,
        upload: data,
    })
}

/// Validates and extracts a job description given as text.
pub async fn analyze_job_description(
    extractor: &dyn ProfileExtractor,
    text: &str,
) -> Result<JobProfile, AppError> {
    let text = validate_job_description(text)?;
    let job = extractor.extract_job(text).await?;
    info!(
        mandatory = job.mandatory_skills.len(),
        required_years = job.required_experience,
        backend = extractor.backend(),
        "Job description analyzed"
    );
    Ok(job)
}

/// Job description uploaded as a document. Returns the profile and the decoded text.
pub async fn analyze_job_description_file(
    extractor: &dyn ProfileExtractor,
    filename: &str,
    data: Bytes,
    max_upload_bytes: usize,
) -> Result<(JobProfile, String), AppError> {
    let text = extract_text(filename, data, max_upload_bytes).await?;
    let job = analyze_job_description(extractor, &text).await?;
    Ok((job, text))
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const RESUME: &str = "\
Jane Doe
jane.doe@example.com | +1 555-123-4567

Professional Summary
Backend engineer with 6 years of experience building payment systems in FinTech.

Experience
Senior Backend Engineer | Acme Payments | 2020 - Present
• Designed and built a Rust ledger service processing 2M transactions per day
Software Developer at Globex, 2017 - 2020
• Developed REST APIs in Python backed by PostgreSQL

Skills
Rust, Python, PostgreSQL, Docker, Git, communication

Education
B.Tech in Computer Science, State University, 2017";

    pub const WEAK_RESUME: &str = "\
John Roe
john.roe@example.com

Professional Summary
Junior support analyst with 1 year of experience in retail operations.

Experience
Support Analyst at ShopCo, 2023 - 2024
• Handled customer tickets and phone support for the store team

Skills
Excel, communication

Education
Diploma in Business Administration";

    pub const JD: &str = "\
Senior Backend Engineer
Requirements: 5+ years of experience with Rust and PostgreSQL. Experience with Docker.
Responsibilities: Design and build backend services for our payments platform.
Nice to have: Kafka.";
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::extraction::RuleBasedExtractor;

    fn upload(name: &str, text: &str) -> ResumeUpload {
        ResumeUpload {
            filename: name.to_string(),
            data: Bytes::from(text.to_string()),
        }
    }

    #[tokio::test]
    async fn test_evaluate_resume_end_to_end() {
        let job = analyze_job_description(&RuleBasedExtractor, JD).await.unwrap();
        let eval = evaluate_resume(&RuleBasedExtractor, &job, upload("jane.txt", RESUME), 1 << 20, "req-1")
            .await
            .unwrap();
        assert_eq!(eval.filename, "jane.txt");
        assert!(eval.result.score_breakdown.matched_skills.contains(&"Rust".to_string()));
        assert!(eval.result.final_score > 0.0 && eval.result.final_score <= 100.0);
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_validation_error() {
        let job = analyze_job_description(&RuleBasedExtractor, JD).await.unwrap();
        let err = evaluate_resume(&RuleBasedExtractor, &job, upload("photo.png", RESUME), 1 << 20, "req-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("Image")));
    }

    #[tokio::test]
    async fn test_short_job_description_rejected() {
        let err = analyze_job_description(&RuleBasedExtractor, "Rust dev").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_job_description_file() {
        let (job, text) = analyze_job_description_file(
            &RuleBasedExtractor,
            "jd.txt",
            Bytes::from_static(JD.as_bytes()),
            1 << 20,
        )
        .await
        .unwrap();
        assert!(text.starts_with("Senior Backend Engineer"));
        assert_eq!(job.required_experience, 5.0);
    }
}
