//! Profile extraction: raw document text in, structured `CandidateProfile` / `JobProfile` out.
//!
//! The scorer never sees raw text. Whatever backend produced a profile, it passes through
//! `finalize_*` so every profile reaching the scorer is trimmed, de-duplicated and non-empty.

pub mod cache;
pub mod document;
pub mod llm;
pub mod prompts;
pub mod rules;
pub mod validation;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::screening::models::{CandidateProfile, JobProfile};

pub use cache::CachedExtractor;
pub use llm::LlmProfileExtractor;
pub use rules::RuleBasedExtractor;

/// Turns document text into structured profiles.
///
/// Implementations must surface failures as `AppError::Extraction` and never return a
/// placeholder profile in place of one they could not build.
#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    async fn extract_candidate(&self, text: &str) -> Result<CandidateProfile, AppError>;

    async fn extract_job(&self, text: &str) -> Result<JobProfile, AppError>;

    /// Short name used in logs, health output and cache keys.
    fn backend(&self) -> &'static str;
}

pub fn finalize_candidate(profile: CandidateProfile) -> Result<CandidateProfile, AppError> {
    let profile = profile.sanitized();
    if !profile.has_content() {
        return Err(AppError::Extraction(
            "No skills, experience, education or roles could be extracted from the resume"
                .to_string(),
        ));
    }
    Ok(profile)
}

pub fn finalize_job(profile: JobProfile) -> Result<JobProfile, AppError> {
    let profile = profile.sanitized();
    if !profile.has_content() {
        return Err(AppError::Extraction(
            "No requirements could be extracted from the job description".to_string(),
        ));
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_rejects_empty_candidate() {
        let err = finalize_candidate(CandidateProfile::default()).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_finalize_rejects_empty_job() {
        let err = finalize_job(JobProfile::default()).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_finalize_sanitizes() {
        let profile = CandidateProfile {
            technical_skills: vec![" Rust ".to_string(), "rust".to_string(), "".to_string()],
            total_experience: -1.0,
            ..Default::default()
        };
        let profile = finalize_candidate(profile).unwrap();
        assert_eq!(profile.technical_skills, vec!["Rust".to_string()]);
        assert_eq!(profile.total_experience, 0.0);
    }
}
