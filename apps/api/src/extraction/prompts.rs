// Prompt constants for profile extraction.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// Role line for resume extraction. Combined with `JSON_ONLY_SYSTEM`.
pub const RESUME_EXTRACT_ROLE: &str = "You are an expert technical recruiter. \
    Extract structured candidate information from a resume exactly as written.";

/// Resume extraction template. Replace `{resume_text}` before sending.
pub const RESUME_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the candidate profile from the resume below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "Two-sentence summary of the candidate taken from the resume",
  "total_experience": 6.5,
  "relevant_experience": 5,
  "technical_skills": ["Rust", "PostgreSQL"],
  "soft_skills": ["Mentoring"],
  "tools": ["Git", "Docker"],
  "certifications": ["AWS Certified Solutions Architect - Associate"],
  "education": ["B.Tech in Computer Science, State University, 2017"],
  "job_titles": ["Senior Backend Engineer", "Software Developer"],
  "projects": ["Built a ledger service processing 2M transactions per day"],
  "achievements": ["Winner, company hackathon 2021"],
  "domain_experience": ["FinTech"],
  "contact_info": {"email": "jane@example.com", "phone": "+1 555 123 4567"},
  "keywords": ["payments", "distributed systems"],
  "seniority": "Senior"
}

Rules:
- total_experience: years across all roles, as a number. Overlapping roles count once.
- relevant_experience: years in technical roles related to the candidate's main skills.
- technical_skills: languages, frameworks, databases, platforms and methods.
- tools: developer and collaboration tools (version control, CI, issue trackers, IDEs).
- job_titles: most recent first, title only (no employer, no dates).
- seniority: one of "Junior", "Mid", "Senior".
- Use the wording of the resume; do not translate skill names into synonyms.

{evidence_instruction}

RESUME:
{resume_text}"#;

/// Role line for job-description extraction. Combined with `JSON_ONLY_SYSTEM`.
pub const JOB_EXTRACT_ROLE: &str = "You are an expert job description analyst. \
    Extract the hiring requirements of a job description exactly as written.";

/// Job-description extraction template. Replace `{jd_text}` before sending.
pub const JOB_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the requirements from the job description below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "mandatory_skills": ["Rust", "PostgreSQL"],
  "good_to_have_skills": ["Kafka"],
  "required_experience": 5,
  "required_tools": ["Docker", "Git"],
  "responsibilities": ["Design and build backend services for the payments platform"],
  "education_requirements": ["Bachelor's degree in Computer Science or related field"],
  "preferred_certifications": ["AWS Certified Solutions Architect"],
  "required_domains": ["FinTech"],
  "keywords": ["payments", "backend", "distributed systems"]
}

Rules:
- mandatory_skills: skills listed as required, must-have, or essential, or stated without qualification.
- good_to_have_skills: skills marked preferred, nice to have, bonus, or "a plus".
- A skill appears in only one of the two lists.
- required_experience: minimum years as a number; for a range like "3-5 years" use 3; 0 if not stated.
- responsibilities: one entry per duty, copied from the description.
- keywords: up to 15 terms a recruiter would search for.

{evidence_instruction}

JOB DESCRIPTION:
{jd_text}"#;

pub fn system_prompt(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

pub fn resume_prompt(resume_text: &str, evidence_instruction: &str) -> String {
    RESUME_EXTRACT_PROMPT_TEMPLATE
        .replace("{evidence_instruction}", evidence_instruction)
        .replace("{resume_text}", resume_text)
}

pub fn job_prompt(jd_text: &str, evidence_instruction: &str) -> String {
    JOB_EXTRACT_PROMPT_TEMPLATE
        .replace("{evidence_instruction}", evidence_instruction)
        .replace("{jd_text}", jd_text)
}
