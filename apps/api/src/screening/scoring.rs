//! Weighted ATS scoring.
//!
//! `score` is a pure function of its two profiles: no I/O, no clock, no randomness.
//! Six sub-scores in [0, 100] are computed independently, rounded to one decimal and
//! combined with fixed weights:
//!
//!   final = 0.40·skills + 0.25·experience + 0.15·role_fit
//!         + 0.10·education + 0.05·certifications + 0.05·keywords_tools
//!
//! The final score is clamped to [0, 100], rounded to one decimal, and banded into a
//! `ScreeningStatus`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::screening::matching::{
    all_tokens_present, canonical, normalize, partition, token_set, TermIndex,
};
use crate::screening::models::{
    AtsResult, CandidateProfile, JobProfile, ScoreBreakdown, ScreeningStatus,
};
use crate::screening::report;

/// Good-to-have skills earn this fraction of a mandatory match.
const GOOD_TO_HAVE_CREDIT: f64 = 0.5;
/// Ceiling for a lower-than-required degree.
const PARTIAL_DEGREE_CREDIT: f64 = 70.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skills: f64,
    pub experience: f64,
    pub role_fit: f64,
    pub education: f64,
    pub certifications: f64,
    pub keywords_tools: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills: 0.40,
            experience: 0.25,
            role_fit: 0.15,
            education: 0.10,
            certifications: 0.05,
            keywords_tools: 0.05,
        }
    }
}

impl ScoringWeights {
    /// Weighted sum of the six category scores, clamped to [0, 100] and rounded.
    pub fn combine(&self, b: &ScoreBreakdown) -> f64 {
        let sum = self.skills * b.skill_match_score
            + self.experience * b.experience_score
            + self.role_fit * b.role_fit_score
            + self.education * b.education_score
            + self.certifications * b.certifications_score
            + self.keywords_tools * b.keywords_tools_score;
        round1(sum.clamp(0.0, 100.0))
    }
}

/// Scores one candidate against one job.
pub fn score(candidate: &CandidateProfile, job: &JobProfile) -> Result<AtsResult, AppError> {
    let breakdown = compute_breakdown(candidate, job)?;
    let final_score = ScoringWeights::default().combine(&breakdown);
    let status = ScreeningStatus::from_score(final_score);
    Ok(report::build(candidate, job, breakdown, final_score, status))
}

fn compute_breakdown(
    candidate: &CandidateProfile,
    job: &JobProfile,
) -> Result<ScoreBreakdown, AppError> {
    // ── Skills ──────────────────────────────────────────────────────────────
    let skill_index = TermIndex::new(
        candidate
            .technical_skills
            .iter()
            .chain(candidate.soft_skills.iter()),
    );
    let (matched_skills, missing_skills) = partition(&job.mandatory_skills, &skill_index);

    let mandatory: HashSet<String> = job.mandatory_skills.iter().map(|s| canonical(s)).collect();
    let matched_good_to_have: Vec<String> = job
        .good_to_have_skills
        .iter()
        .filter(|s| !mandatory.contains(&canonical(s)))
        .filter(|s| skill_index.contains(s))
        .cloned()
        .collect();

    let skill_match_score = skill_score(
        matched_skills.len(),
        matched_good_to_have.len(),
        job.mandatory_skills.len(),
    );

    // ── Experience / role fit / education ───────────────────────────────────
    let experience_score =
        experience_score(candidate.relevant_experience, job.required_experience);
    let role_fit_score = role_fit_score(candidate, job);
    let education_score = education_score(&candidate.education, &job.education_requirements);

    // ── Certifications ──────────────────────────────────────────────────────
    let (matched_certifications, missing_certifications): (Vec<String>, Vec<String>) = job
        .preferred_certifications
        .iter()
        .cloned()
        .partition(|cert| certification_held(cert, &candidate.certifications));
    let certifications_score = coverage(
        matched_certifications.len(),
        job.preferred_certifications.len(),
    );

    // ── Keywords and tools ──────────────────────────────────────────────────
    let keyword_index = TermIndex::new(
        candidate
            .keywords
            .iter()
            .chain(candidate.technical_skills.iter())
            .chain(candidate.tools.iter()),
    );
    let (matched_keywords, missing_keywords) = partition(&job.keywords, &keyword_index);
    let keyword_match_score = coverage(matched_keywords.len(), job.keywords.len());

    let tool_index = TermIndex::new(
        candidate
            .tools
            .iter()
            .chain(candidate.technical_skills.iter()),
    );
    let (matched_tools, missing_tools) = partition(&job.required_tools, &tool_index);
    let tool_match_score = coverage(matched_tools.len(), job.required_tools.len());

    let keyword_match_score = finite("keyword_match_score", keyword_match_score)?;
    let tool_match_score = finite("tool_match_score", tool_match_score)?;
    let keywords_tools_score = round1((keyword_match_score + tool_match_score) / 2.0);

    Ok(ScoreBreakdown {
        skill_match_score: finite("skill_match_score", skill_match_score)?,
        experience_score: finite("experience_score", experience_score)?,
        role_fit_score: finite("role_fit_score", role_fit_score)?,
        education_score: finite("education_score", education_score)?,
        certifications_score: finite("certifications_score", certifications_score)?,
        keywords_tools_score,
        keyword_match_score,
        tool_match_score,
        matched_skills,
        missing_skills,
        matched_good_to_have,
        matched_tools,
        missing_tools,
        matched_keywords,
        missing_keywords,
        matched_certifications,
        missing_certifications,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Category formulas
// ────────────────────────────────────────────────────────────────────────────

/// `(m + 0.5·g) / |mandatory| · 100`, capped at 100. No mandatory skills means full credit.
pub fn skill_score(mandatory_matched: usize, good_to_have_matched: usize, mandatory: usize) -> f64 {
    if mandatory == 0 {
        return 100.0;
    }
    let credit = mandatory_matched as f64 + GOOD_TO_HAVE_CREDIT * good_to_have_matched as f64;
    (credit / mandatory as f64 * 100.0).min(100.0)
}

/// Over-qualification is never penalized.
pub fn experience_score(relevant: f64, required: f64) -> f64 {
    if required <= 0.0 {
        return 100.0;
    }
    (relevant.max(0.0) / required.max(1.0) * 100.0).min(100.0)
}

/// Share of responsibility tokens that appear in the candidate's titles and projects.
pub fn role_fit_score(candidate: &CandidateProfile, job: &JobProfile) -> f64 {
    let job_tokens = token_set(&job.responsibilities);
    if job_tokens.is_empty() {
        return 100.0;
    }
    let candidate_tokens = token_set(candidate.job_titles.iter().chain(candidate.projects.iter()));
    let overlap = job_tokens.intersection(&candidate_tokens).count();
    coverage(overlap, job_tokens.len())
}

pub fn education_score(entries: &[String], requirements: &[String]) -> f64 {
    if requirements.is_empty() {
        return 100.0;
    }
    let normalized: Vec<String> = entries.iter().map(|e| normalize(e)).collect();
    let candidate_level = entries.iter().filter_map(|e| degree_level(e)).max();
    let candidate_tokens = token_set(entries);

    let mut best: f64 = 0.0;
    for requirement in requirements {
        let wanted = normalize(requirement);
        if !wanted.is_empty() && normalized.iter().any(|e| e.contains(&wanted)) {
            return 100.0;
        }
        match (degree_level(requirement), candidate_level) {
            (Some(required), Some(held)) if held >= required => return 100.0,
            (Some(required), Some(held)) => {
                best = best.max(held as f64 / required as f64 * PARTIAL_DEGREE_CREDIT);
            }
            (Some(_), None) => {}
            (None, _) => {
                if all_tokens_present(requirement, &candidate_tokens) {
                    return 100.0;
                }
            }
        }
    }
    best
}

static DEGREE_LEVELS: Lazy<Vec<(Regex, u8)>> = Lazy::new(|| {
    [
        (r"\b(?:ph\.?\s?d\b|doctor(?:ate|al)\b)", 5),
        (r"\b(?:master'?s?\b|m\.?\s?sc\b|m\.?\s?tech\b|mba\b|m\.s\.|m\.e\.|post\s?-?graduate\b)", 4),
        (r"\b(?:bachelor'?s?\b|b\.?\s?sc\b|b\.?\s?tech\b|b\.s\.|b\.e\.|b\.a\.|bca\b|undergraduate\b)", 3),
        (r"\bassociate\b", 2),
        (r"\bdiploma\b", 1),
    ]
    .into_iter()
    .map(|(pattern, level)| (Regex::new(pattern).expect("degree regex"), level))
    .collect()
});

/// Highest degree level named in `text`: 5 doctorate, 4 master, 3 bachelor, 2 associate, 1 diploma.
pub fn degree_level(text: &str) -> Option<u8> {
    let lower = text.to_lowercase();
    DEGREE_LEVELS
        .iter()
        .filter(|(re, _)| re.is_match(&lower))
        .map(|(_, level)| *level)
        .max()
}

/// A held certification satisfies a requirement when both resolve to the same canonical
/// term or the held one names every token of the requirement. Tokens are whole words, so
/// `CKA` never covers `CKAD` and a bare `AWS` never covers a specific AWS certification.
fn certification_held(required: &str, held: &[String]) -> bool {
    let wanted = canonical(required);
    if wanted.is_empty() {
        return false;
    }
    held.iter().any(|cert| {
        let cert_tokens = token_set(std::iter::once(cert));
        canonical(cert) == wanted || all_tokens_present(required, &cert_tokens)
    })
}

/// `matched / total · 100`; an empty requirement list is fully covered.
fn coverage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        matched as f64 / total as f64 * 100.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn finite(name: &str, value: f64) -> Result<f64, AppError> {
    if value.is_finite() {
        Ok(round1(value.clamp(0.0, 100.0)))
    } else {
        Err(AppError::Computation(format!("{name} is not a finite number")))
    }
}
