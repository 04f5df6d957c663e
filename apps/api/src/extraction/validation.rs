//! Input checks applied before any extraction call is spent on a document.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;

pub const MIN_JOB_DESCRIPTION_CHARS: usize = 50;
pub const MIN_RESUME_CHARS: usize = 100;
/// Out of the six indicator groups below.
pub const MIN_RESUME_INDICATORS: usize = 4;

/// Identity and financial documents that are sometimes uploaded in place of a resume.
static NON_RESUME_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:aadhaar|aadhar|government of india|unique identification|pan card|passport|driving licen[cs]e|voter id|birth certificate|marriage certificate|school leaving certificate|mark sheet|report card|bank statement|salary slip|invoice|receipt|bill payment)\b",
    )
    .expect("non-resume marker regex")
});

const INDICATOR_GROUPS: [&[&str]; 6] = [
    // contact
    &["email", "@", "phone", "contact", "linkedin"],
    // experience
    &["experience", "employment history", "career history", "work history"],
    // education
    &["education", "degree", "university", "college", "school"],
    // skills
    &["skill", "ability", "proficient", "knowledge", "expertise"],
    // professional terms
    &["resume", "curriculum vitae", "professional", "manager", "developer", "engineer", "analyst"],
    // projects and achievements
    &["project", "achievement", "accomplishment", "responsibilit"],
];

/// Returns the trimmed job description.
pub fn validate_job_description(text: &str) -> Result<&str, AppError> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_JOB_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "Job description must be at least {MIN_JOB_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

pub fn validate_resume_text(filename: &str, text: &str) -> Result<(), AppError> {
    if text.trim().chars().count() < MIN_RESUME_CHARS {
        return Err(AppError::Validation(format!(
            "Could not extract enough text from '{filename}' (minimum {MIN_RESUME_CHARS} characters). \
             Scanned PDFs without a text layer are not supported"
        )));
    }

    if let Some(marker) = NON_RESUME_MARKERS.find(text) {
        tracing::warn!(filename, marker = marker.as_str(), "Rejected non-resume document");
        return Err(AppError::Validation(format!(
            "'{filename}' does not look like a resume (it appears to be an identity or financial document)"
        )));
    }

    let found = resume_indicator_count(text);
    if found < MIN_RESUME_INDICATORS {
        tracing::warn!(filename, found, "Rejected document with too few resume indicators");
        return Err(AppError::Validation(format!(
            "'{filename}' does not look like a resume. Include contact details, experience, education and skills"
        )));
    }

    Ok(())
}

pub fn resume_indicator_count(text: &str) -> usize {
    let lower = text.to_lowercase();
    INDICATOR_GROUPS
        .iter()
        .filter(|group| group.iter().any(|term| lower.contains(term)))
        .count()
}
