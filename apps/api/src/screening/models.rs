//! Screening data model: the two extracted profiles and the derived result.
//!
//! Every profile field has a documented default so partially filled extraction output
//! deserializes cleanly: absent or `null` collections are empty, absent numbers are 0.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Profiles
// ────────────────────────────────────────────────────────────────────────────

/// Structured resume fields. Immutable once extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default, alias = "candidate_summary", deserialize_with = "null_as_default")]
    pub summary: String,
    /// Years. Fractions allowed.
    #[serde(default, alias = "total_experience_years", deserialize_with = "years")]
    pub total_experience: f64,
    #[serde(default, alias = "relevant_experience_years", deserialize_with = "years")]
    pub relevant_experience: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technical_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub soft_skills: Vec<String>,
    #[serde(default, alias = "tools_technologies", deserialize_with = "null_as_default")]
    pub tools: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certifications: Vec<String>,
    #[serde(default, alias = "education_details", deserialize_with = "null_as_default")]
    pub education: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_titles: Vec<String>,
    #[serde(default, alias = "projects_responsibilities", deserialize_with = "null_as_default")]
    pub projects: Vec<String>,
    #[serde(default, alias = "achievements_awards", deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain_experience: Vec<String>,
    #[serde(default, alias = "contact_information", deserialize_with = "null_as_default")]
    pub contact_info: BTreeMap<String, String>,
    #[serde(default, alias = "resume_keywords", deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default, alias = "seniority_level", deserialize_with = "null_as_default")]
    pub seniority: String,
}

/// Structured job-description requirements. Immutable once extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mandatory_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub good_to_have_skills: Vec<String>,
    #[serde(default, alias = "required_experience_years", deserialize_with = "years")]
    pub required_experience: f64,
    #[serde(default, alias = "required_tools_technologies", deserialize_with = "null_as_default")]
    pub required_tools: Vec<String>,
    #[serde(default, alias = "role_responsibilities", deserialize_with = "null_as_default")]
    pub responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education_requirements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferred_certifications: Vec<String>,
    #[serde(default, alias = "required_industry_domain", deserialize_with = "null_as_default")]
    pub required_domains: Vec<String>,
    #[serde(default, alias = "relevant_keywords", deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

impl CandidateProfile {
    /// Trims and de-duplicates every list, clamps years to a finite non-negative value.
    pub fn sanitized(self) -> Self {
        Self {
            summary: collapse_whitespace(&self.summary),
            total_experience: clamp_years(self.total_experience),
            relevant_experience: clamp_years(self.relevant_experience),
            technical_skills: clean_list(self.technical_skills),
            soft_skills: clean_list(self.soft_skills),
            tools: clean_list(self.tools),
            certifications: clean_list(self.certifications),
            education: clean_list(self.education),
            job_titles: clean_list(self.job_titles),
            projects: clean_list(self.projects),
            achievements: clean_list(self.achievements),
            domain_experience: clean_list(self.domain_experience),
            contact_info: self
                .contact_info
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                .collect(),
            keywords: clean_list(self.keywords),
            seniority: self.seniority.trim().to_string(),
        }
    }

    /// False when extraction produced nothing that scoring could use.
    pub fn has_content(&self) -> bool {
        self.total_experience > 0.0
            || self.relevant_experience > 0.0
            || [
                &self.technical_skills,
                &self.soft_skills,
                &self.tools,
                &self.certifications,
                &self.education,
                &self.job_titles,
                &self.projects,
                &self.keywords,
            ]
            .iter()
            .any(|list| !list.is_empty())
    }
}

impl JobProfile {
    pub fn sanitized(self) -> Self {
        Self {
            mandatory_skills: clean_list(self.mandatory_skills),
            good_to_have_skills: clean_list(self.good_to_have_skills),
            required_experience: clamp_years(self.required_experience),
            required_tools: clean_list(self.required_tools),
            responsibilities: clean_list(self.responsibilities),
            education_requirements: clean_list(self.education_requirements),
            preferred_certifications: clean_list(self.preferred_certifications),
            required_domains: clean_list(self.required_domains),
            keywords: clean_list(self.keywords),
        }
    }

    /// False when the JD yielded no requirement at all. Scoring such a profile
    /// would hand every candidate full marks.
    pub fn has_content(&self) -> bool {
        self.required_experience > 0.0
            || [
                &self.mandatory_skills,
                &self.good_to_have_skills,
                &self.required_tools,
                &self.responsibilities,
                &self.education_requirements,
                &self.preferred_certifications,
                &self.keywords,
            ]
            .iter()
            .any(|list| !list.is_empty())
    }

    pub fn analysis_summary(&self) -> JobAnalysisSummary {
        JobAnalysisSummary {
            mandatory_skills_count: self.mandatory_skills.len(),
            good_to_have_skills_count: self.good_to_have_skills.len(),
            required_experience_years: self.required_experience,
            tools_technologies_count: self.required_tools.len(),
            education_requirements_specified: !self.education_requirements.is_empty(),
            certifications_preferred: !self.preferred_certifications.is_empty(),
            industry_domains: self.required_domains.clone(),
            key_keywords_count: self.keywords.len(),
        }
    }
}

/// Counts returned by the JD analysis endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAnalysisSummary {
    pub mandatory_skills_count: usize,
    pub good_to_have_skills_count: usize,
    pub required_experience_years: f64,
    pub tools_technologies_count: usize,
    pub education_requirements_specified: bool,
    pub certifications_preferred: bool,
    pub industry_domains: Vec<String>,
    pub key_keywords_count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

/// Screening band derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningStatus {
    /// final ≥ 80
    Shortlisted,
    /// 50 ≤ final < 80
    Borderline,
    /// final < 50
    NotShortlisted,
}

pub const SHORTLIST_THRESHOLD: f64 = 80.0;
pub const BORDERLINE_THRESHOLD: f64 = 50.0;

impl ScreeningStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= SHORTLIST_THRESHOLD {
            ScreeningStatus::Shortlisted
        } else if score >= BORDERLINE_THRESHOLD {
            ScreeningStatus::Borderline
        } else {
            ScreeningStatus::NotShortlisted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScreeningStatus::Shortlisted => "SHORTLISTED",
            ScreeningStatus::Borderline => "BORDERLINE",
            ScreeningStatus::NotShortlisted => "NOT_SHORTLISTED",
        }
    }
}

/// Per-category sub-scores in [0, 100] plus the matched/missing sets behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_match_score: f64,
    pub experience_score: f64,
    pub role_fit_score: f64,
    pub education_score: f64,
    pub certifications_score: f64,
    /// Mean of `keyword_match_score` and `tool_match_score`.
    pub keywords_tools_score: f64,
    pub keyword_match_score: f64,
    pub tool_match_score: f64,

    /// Mandatory skills only; together with `missing_skills` partitions `mandatory_skills`.
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub matched_good_to_have: Vec<String>,
    pub matched_tools: Vec<String>,
    pub missing_tools: Vec<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub matched_certifications: Vec<String>,
    pub missing_certifications: Vec<String>,
}

/// One evaluation of one resume against one job. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsResult {
    pub final_score: f64,
    pub status: ScreeningStatus,
    pub score_breakdown: ScoreBreakdown,
    pub professional_summary: String,
    pub suggestions: Vec<String>,
    pub keywords_to_add: Vec<String>,
    pub final_recommendation: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Trims entries, collapses inner whitespace, drops empties and case-insensitive
/// duplicates. First occurrence wins, order is preserved.
pub fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| collapse_whitespace(&s))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp_years(years: f64) -> f64 {
    if years.is_finite() {
        years.clamp(0.0, 60.0)
    } else {
        0.0
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `5`, `5.5`, `"5"`, `"5+ years"` or `null`. Unparseable strings become 0.
fn years<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => n,
        Some(Raw::Text(s)) => leading_number(&s).unwrap_or(0.0),
        None => 0.0,
    })
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_boundaries() {
        assert_eq!(ScreeningStatus::from_score(80.0), ScreeningStatus::Shortlisted);
        assert_eq!(ScreeningStatus::from_score(79.99), ScreeningStatus::Borderline);
        assert_eq!(ScreeningStatus::from_score(79.9), ScreeningStatus::Borderline);
        assert_eq!(ScreeningStatus::from_score(50.0), ScreeningStatus::Borderline);
        assert_eq!(ScreeningStatus::from_score(49.99), ScreeningStatus::NotShortlisted);
        assert_eq!(ScreeningStatus::from_score(0.0), ScreeningStatus::NotShortlisted);
        assert_eq!(ScreeningStatus::from_score(100.0), ScreeningStatus::Shortlisted);
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ScreeningStatus::NotShortlisted).unwrap();
        assert_eq!(json, r#""NOT_SHORTLISTED""#);
        assert_eq!(ScreeningStatus::Borderline.as_str(), "BORDERLINE");
    }

    #[test]
    fn test_candidate_missing_fields_default() {
        let profile: CandidateProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, CandidateProfile::default());
        assert_eq!(profile.total_experience, 0.0);
        assert!(profile.technical_skills.is_empty());
    }

    #[test]
    fn test_null_fields_default() {
        let json = r#"{
            "technical_skills": null,
            "total_experience": null,
            "contact_info": null,
            "seniority": null
        }"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();
        assert!(profile.technical_skills.is_empty());
        assert_eq!(profile.total_experience, 0.0);
        assert!(profile.contact_info.is_empty());
    }

    #[test]
    fn test_years_accepts_strings() {
        let job: JobProfile =
            serde_json::from_str(r#"{"required_experience": "5+ years"}"#).unwrap();
        assert_eq!(job.required_experience, 5.0);

        let job: JobProfile = serde_json::from_str(r#"{"required_experience": "n/a"}"#).unwrap();
        assert_eq!(job.required_experience, 0.0);
    }

    #[test]
    fn test_original_field_names_are_accepted() {
        let json = r#"{
            "tools_technologies": ["Git"],
            "education_details": ["B.Sc. Computer Science"],
            "resume_keywords": ["react"],
            "seniority_level": "Mid"
        }"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.tools, vec!["Git"]);
        assert_eq!(profile.education.len(), 1);
        assert_eq!(profile.keywords, vec!["react"]);
        assert_eq!(profile.seniority, "Mid");

        let job: JobProfile = serde_json::from_str(
            r#"{"role_responsibilities": ["Build APIs"], "relevant_keywords": ["api"]}"#,
        )
        .unwrap();
        assert_eq!(job.responsibilities, vec!["Build APIs"]);
        assert_eq!(job.keywords, vec!["api"]);
    }

    #[test]
    fn test_clean_list_dedups_case_insensitively_in_order() {
        let cleaned = clean_list(vec![
            " React ".to_string(),
            "react".to_string(),
            "".to_string(),
            "Type   Script".to_string(),
        ]);
        assert_eq!(cleaned, vec!["React", "Type Script"]);
    }

    #[test]
    fn test_sanitized_clamps_years() {
        let profile = CandidateProfile {
            total_experience: -3.0,
            relevant_experience: f64::NAN,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(profile.total_experience, 0.0);
        assert_eq!(profile.relevant_experience, 0.0);
    }

    #[test]
    fn test_has_content() {
        assert!(!CandidateProfile::default().has_content());
        assert!(!JobProfile::default().has_content());

        let job = JobProfile {
            mandatory_skills: vec!["Rust".to_string()],
            ..Default::default()
        };
        assert!(job.has_content());
    }

    #[test]
    fn test_analysis_summary_counts() {
        let job = JobProfile {
            mandatory_skills: vec!["React".to_string(), "TypeScript".to_string()],
            required_experience: 3.0,
            required_domains: vec!["Finance".to_string()],
            ..Default::default()
        };
        let summary = job.analysis_summary();
        assert_eq!(summary.mandatory_skills_count, 2);
        assert_eq!(summary.required_experience_years, 3.0);
        assert!(!summary.education_requirements_specified);
        assert_eq!(summary.industry_domains, vec!["Finance"]);
    }
}
