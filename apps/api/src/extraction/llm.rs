use async_trait::async_trait;
use tracing::{debug, info_span, Instrument};

use crate::errors::AppError;
use crate::extraction::prompts::{
    job_prompt, resume_prompt, system_prompt, JOB_EXTRACT_ROLE, RESUME_EXTRACT_ROLE,
};
use crate::extraction::{finalize_candidate, finalize_job, ProfileExtractor};
use crate::llm_client::prompts::EVIDENCE_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};
use crate::screening::models::{CandidateProfile, JobProfile};

/// Longer documents are cut before prompting. Resumes and JDs rarely come close.
const MAX_PROMPT_CHARS: usize = 30_000;

/// Extracts profiles through the LLM client.
pub struct LlmProfileExtractor {
    llm: LlmClient,
}

impl LlmProfileExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ProfileExtractor for LlmProfileExtractor {
    async fn extract_candidate(&self, text: &str) -> Result<CandidateProfile, AppError> {
        let prompt = resume_prompt(truncate_chars(text, MAX_PROMPT_CHARS), EVIDENCE_INSTRUCTION);
        let profile: CandidateProfile = self
            .llm
            .call_json(&prompt, &system_prompt(RESUME_EXTRACT_ROLE))
            .instrument(info_span!("extract_candidate", chars = text.len()))
            .await
            .map_err(|e| extraction_error("Resume", e))?;
        debug!(skills = profile.technical_skills.len(), "Candidate profile extracted");
        finalize_candidate(profile)
    }

    async fn extract_job(&self, text: &str) -> Result<JobProfile, AppError> {
        let prompt = job_prompt(truncate_chars(text, MAX_PROMPT_CHARS), EVIDENCE_INSTRUCTION);
        let profile: JobProfile = self
            .llm
            .call_json(&prompt, &system_prompt(JOB_EXTRACT_ROLE))
            .instrument(info_span!("extract_job", chars = text.len()))
            .await
            .map_err(|e| extraction_error("Job description", e))?;
        debug!(
            mandatory = profile.mandatory_skills.len(),
            "Job profile extracted"
        );
        finalize_job(profile)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

fn extraction_error(what: &str, err: LlmError) -> AppError {
    match err {
        LlmError::Parse(e) => {
            AppError::Extraction(format!("{what} extraction returned unparseable data: {e}"))
        }
        other => AppError::Extraction(format!("{what} extraction failed: {other}")),
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
