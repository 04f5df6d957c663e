//! Recruiter-facing text derived from a score breakdown. Deterministic: the same
//! inputs always produce the same suggestions, keywords and summary.

use std::collections::HashSet;

use crate::screening::matching::normalize;
use crate::screening::models::{
    AtsResult, CandidateProfile, JobProfile, ScoreBreakdown, ScreeningStatus,
};

const MAX_SUGGESTIONS: usize = 8;
const MAX_SKILL_SUGGESTIONS: usize = 5;
const MAX_LISTED: usize = 3;
const MAX_KEYWORDS_TO_ADD: usize = 10;

pub fn build(
    candidate: &CandidateProfile,
    job: &JobProfile,
    breakdown: ScoreBreakdown,
    final_score: f64,
    status: ScreeningStatus,
) -> AtsResult {
    AtsResult {
        final_score,
        status,
        professional_summary: professional_summary(candidate, job, &breakdown, final_score, status),
        suggestions: suggestions(candidate, job, &breakdown, final_score),
        keywords_to_add: keywords_to_add(&breakdown),
        final_recommendation: final_recommendation(&breakdown, final_score, status),
        score_breakdown: breakdown,
    }
}

pub fn suggestions(
    candidate: &CandidateProfile,
    job: &JobProfile,
    b: &ScoreBreakdown,
    final_score: f64,
) -> Vec<String> {
    let mut out: Vec<String> = b
        .missing_skills
        .iter()
        .take(MAX_SKILL_SUGGESTIONS)
        .map(|skill| format!("Develop and demonstrate {skill}: add a project or role where you used it."))
        .collect();

    if !b.missing_tools.is_empty() {
        out.push(format!("Learn required tools: {}.", join_first(&b.missing_tools)));
    }
    if !b.missing_certifications.is_empty() {
        out.push(format!(
            "Obtain certifications: {}.",
            join_first(&b.missing_certifications)
        ));
    }
    if b.experience_score < 70.0 {
        out.push(format!(
            "Gain more relevant experience: the role asks for {} years, the resume shows {}.",
            job.required_experience, candidate.relevant_experience
        ));
    }
    if b.education_score < 70.0 {
        out.push("Consider pursuing the education level or field the role requires.".to_string());
    }
    if b.role_fit_score < 60.0 {
        out.push("Highlight more relevant project experience and responsibilities.".to_string());
    }
    if final_score < 60.0 {
        out.push("Consider targeted training to close the gaps before applying to similar roles.".to_string());
    }

    out.truncate(MAX_SUGGESTIONS);
    out
}

/// Missing mandatory skills, then missing tools, then missing keywords.
pub fn keywords_to_add(b: &ScoreBreakdown) -> Vec<String> {
    let mut seen = HashSet::new();
    b.missing_skills
        .iter()
        .chain(b.missing_tools.iter())
        .chain(b.missing_keywords.iter())
        .filter(|k| seen.insert(normalize(k)))
        .take(MAX_KEYWORDS_TO_ADD)
        .cloned()
        .collect()
}

pub fn professional_summary(
    candidate: &CandidateProfile,
    job: &JobProfile,
    b: &ScoreBreakdown,
    final_score: f64,
    status: ScreeningStatus,
) -> String {
    let mut lines = Vec::with_capacity(4);

    lines.push(format!(
        "Candidate shows {final_score:.1}% overall fit with {} years total experience ({} years relevant).",
        candidate.total_experience, candidate.relevant_experience
    ));

    let required = job.mandatory_skills.len();
    lines.push(if required == 0 {
        format!("No mandatory skills were specified. Status: {}.", status.as_str())
    } else if b.matched_skills.is_empty() {
        format!(
            "Limited skill alignment (0/{required} mandatory skills). Status: {}.",
            status.as_str()
        )
    } else {
        format!(
            "Matches {}/{required} mandatory skills ({}). Status: {}.",
            b.matched_skills.len(),
            join_first(&b.matched_skills),
            status.as_str()
        )
    });

    let level = if candidate.seniority.is_empty() {
        "Candidate".to_string()
    } else {
        format!("{}-level candidate", candidate.seniority)
    };
    let domain = if candidate.domain_experience.is_empty() {
        String::new()
    } else {
        format!(
            " in {}",
            candidate.domain_experience.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
        )
    };
    let roles = if candidate.job_titles.is_empty() {
        "various roles".to_string()
    } else {
        candidate.job_titles.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
    };
    lines.push(format!("Profile: {level}{domain} with experience as {roles}."));

    lines.push(
        match status {
            ScreeningStatus::Shortlisted => "Recommended for interview: strong technical alignment.",
            ScreeningStatus::Borderline => {
                "Borderline candidate: requires skills development for optimal fit."
            }
            ScreeningStatus::NotShortlisted => "Not recommended: significant skill gaps present.",
        }
        .to_string(),
    );

    lines.join(" ")
}

pub fn final_recommendation(b: &ScoreBreakdown, final_score: f64, status: ScreeningStatus) -> String {
    match status {
        ScreeningStatus::Shortlisted => format!(
            "RECOMMEND FOR INTERVIEW: Strong candidate with {final_score:.1}% ATS match. Proceed to technical screening."
        ),
        ScreeningStatus::Borderline => {
            let mut gaps = Vec::new();
            if b.skill_match_score < 60.0 {
                gaps.push("skills");
            }
            if b.experience_score < 60.0 {
                gaps.push("experience");
            }
            if b.role_fit_score < 60.0 {
                gaps.push("role alignment");
            }
            let gaps = if gaps.is_empty() {
                "multiple areas".to_string()
            } else {
                gaps.join(", ")
            };
            format!(
                "CONDITIONAL CONSIDERATION: {final_score:.1}% match with gaps in {gaps}. Consider for junior roles or with additional training."
            )
        }
        ScreeningStatus::NotShortlisted => format!(
            "NOT RECOMMENDED: {final_score:.1}% ATS match insufficient. Significant skill and experience gaps present."
        ),
    }
}

fn join_first(items: &[String]) -> String {
    items
        .iter()
        .take(MAX_LISTED)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}
