//! Rule-based profile extraction.
//!
//! Deterministic and offline: vocabulary scans for skills, tools and domains, line
//! heuristics for titles, projects, education and certifications, and regexes for
//! years of experience and contact details. Used when no AI key is configured and
//! by the router tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;
use crate::extraction::{finalize_candidate, finalize_job, ProfileExtractor};
use crate::screening::matching::tokenize;
use crate::screening::models::{clean_list, CandidateProfile, JobProfile};

const MAX_TITLES: usize = 10;
const MAX_PROJECTS: usize = 15;
const MAX_RESPONSIBILITIES: usize = 10;
const MAX_EDUCATION_REQUIREMENTS: usize = 5;
const MAX_CANDIDATE_KEYWORDS: usize = 20;
const MAX_JOB_KEYWORDS: usize = 15;
const MAX_YEARS: f64 = 50.0;

pub struct RuleBasedExtractor;

#[async_trait]
impl ProfileExtractor for RuleBasedExtractor {
    async fn extract_candidate(&self, text: &str) -> Result<CandidateProfile, AppError> {
        finalize_candidate(candidate_profile(text, chrono::Utc::now().year()))
    }

    async fn extract_job(&self, text: &str) -> Result<JobProfile, AppError> {
        finalize_job(job_profile(text))
    }

    fn backend(&self) -> &'static str {
        "rules"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vocabularies
// ────────────────────────────────────────────────────────────────────────────

struct Term {
    name: &'static str,
    pattern: Regex,
}

fn vocabulary(entries: &[(&'static str, &str)]) -> Vec<Term> {
    entries
        .iter()
        .map(|&(name, pattern)| Term {
            name,
            pattern: Regex::new(&format!("(?i){pattern}")).expect("vocabulary regex"),
        })
        .collect()
}

static TECH_SKILLS: Lazy<Vec<Term>> = Lazy::new(|| {
    vocabulary(&[
        ("Python", r"\bpython\d?\b"),
        ("Java", r"\bjava\b"),
        ("JavaScript", r"\bjavascript\b|\bjs\b|\becmascript\b"),
        ("TypeScript", r"\btypescript\b"),
        ("C++", r"\bc\+\+"),
        ("C#", r"\bc#"),
        ("Go", r"(?-i:\bGo\b)|\bgolang\b"),
        ("Rust", r"\brust\b"),
        ("Ruby", r"\bruby\b"),
        ("PHP", r"\bphp\b"),
        ("Swift", r"\bswift\b"),
        ("Kotlin", r"\bkotlin\b"),
        ("Scala", r"\bscala\b"),
        ("SQL", r"\bsql\b"),
        ("MySQL", r"\bmysql\b"),
        ("PostgreSQL", r"\bpostgres(?:ql)?\b"),
        ("MongoDB", r"\bmongo(?:db)?\b"),
        ("Redis", r"\bredis\b"),
        ("Elasticsearch", r"\belastic\s*search\b"),
        ("React", r"\breact(?:\.?js)?\b"),
        ("Angular", r"\bangular(?:\.?js)?\b"),
        ("Vue", r"\bvue(?:\.?js)?\b"),
        ("Node.js", r"\bnode(?:\.?js)?\b"),
        ("Express", r"\bexpress\.?js\b"),
        ("Django", r"\bdjango\b"),
        ("Flask", r"\bflask\b"),
        ("FastAPI", r"\bfastapi\b"),
        ("Spring Boot", r"\bspring\s*boot\b"),
        ("GraphQL", r"\bgraphql\b"),
        ("REST API", r"\brestful\b|\brest\s*apis?\b"),
        ("Microservices", r"\bmicro-?services?\b"),
        ("HTML", r"\bhtml5?\b"),
        ("CSS", r"\bcss3?\b"),
        ("AWS", r"\baws\b|\bamazon web services\b"),
        ("Azure", r"\bazure\b"),
        ("GCP", r"\bgcp\b|\bgoogle cloud\b"),
        ("Docker", r"\bdocker\b"),
        ("Kubernetes", r"\bkubernetes\b|\bk8s\b"),
        ("Terraform", r"\bterraform\b"),
        ("Linux", r"\blinux\b"),
        ("Kafka", r"\bkafka\b"),
        ("Spark", r"\b(?:apache\s+)?spark\b"),
        ("Hadoop", r"\bhadoop\b"),
        ("Machine Learning", r"\bmachine\s+learning\b|\bml\b"),
        ("Deep Learning", r"\bdeep\s+learning\b"),
        ("NLP", r"\bnlp\b|\bnatural language processing\b"),
        ("TensorFlow", r"\btensorflow\b"),
        ("PyTorch", r"\bpytorch\b"),
        ("Pandas", r"\bpandas\b"),
        ("NumPy", r"\bnumpy\b"),
        ("Scikit-learn", r"\bscikit-learn\b|\bsklearn\b"),
        ("Data Analysis", r"\bdata\s+analy(?:sis|tics)\b"),
        ("Tableau", r"\btableau\b"),
        ("Power BI", r"\bpower\s*bi\b"),
        ("Excel", r"\bexcel\b"),
    ])
});

static TOOLS: Lazy<Vec<Term>> = Lazy::new(|| {
    vocabulary(&[
        ("Git", r"\bgit\b"),
        ("GitHub", r"\bgithub\b"),
        ("GitLab", r"\bgitlab\b"),
        ("Bitbucket", r"\bbitbucket\b"),
        ("Jenkins", r"\bjenkins\b"),
        ("Docker", r"\bdocker\b"),
        ("Kubernetes", r"\bkubernetes\b|\bk8s\b"),
        ("Terraform", r"\bterraform\b"),
        ("Ansible", r"\bansible\b"),
        ("CI/CD", r"\bci\s*/\s*cd\b|\bcontinuous integration\b"),
        ("Jira", r"\bjira\b"),
        ("Confluence", r"\bconfluence\b"),
        ("Trello", r"\btrello\b"),
        ("Postman", r"\bpostman\b"),
        ("Swagger", r"\bswagger\b"),
        ("VS Code", r"\bvs\s*code\b|\bvisual studio code\b"),
        ("IntelliJ", r"\bintellij\b"),
        ("Eclipse", r"\beclipse\b"),
        ("Slack", r"\bslack\b"),
        ("Figma", r"\bfigma\b"),
        ("Grafana", r"\bgrafana\b"),
        ("Prometheus", r"\bprometheus\b"),
        ("Webpack", r"\bwebpack\b"),
        ("Maven", r"\bmaven\b"),
        ("Gradle", r"\bgradle\b"),
    ])
});

static SOFT_SKILLS: Lazy<Vec<Term>> = Lazy::new(|| {
    vocabulary(&[
        ("Leadership", r"\bleadership\b|\bled\s+(?:a\s+)?team"),
        ("Communication", r"\bcommunication\b"),
        ("Teamwork", r"\bteam\s*work\b|\bteam player\b"),
        ("Problem Solving", r"\bproblem[\s-]solving\b"),
        ("Analytical", r"\banalytical\b"),
        ("Creativity", r"\bcreativ(?:e|ity)\b"),
        ("Collaboration", r"\bcollaborat\w*"),
        ("Presentation", r"\bpresentation\b"),
        ("Negotiation", r"\bnegotiat\w*"),
        ("Time Management", r"\btime\s+management\b"),
        ("Adaptability", r"\badaptab\w*"),
        ("Mentoring", r"\bmentor\w*"),
        ("Attention to Detail", r"\battention to detail\b"),
    ])
});

static DOMAINS: Lazy<Vec<Term>> = Lazy::new(|| {
    vocabulary(&[
        ("FinTech", r"\bfintech\b"),
        ("Finance", r"\bfinance\b|\bfinancial services\b"),
        ("Banking", r"\bbanking\b"),
        ("Insurance", r"\binsurance\b"),
        ("Healthcare", r"\bhealth\s*care\b"),
        ("EdTech", r"\bedtech\b|\beducation technology\b"),
        ("Retail", r"\bretail\b"),
        ("E-commerce", r"\be-?commerce\b"),
        ("Manufacturing", r"\bmanufacturing\b"),
        ("Telecommunications", r"\btelecom\w*"),
        ("Automotive", r"\bautomotive\b"),
        ("Real Estate", r"\breal estate\b"),
        ("Media", r"\bmedia\b"),
        ("Gaming", r"\bgaming\b"),
        ("Logistics", r"\blogistics\b"),
        ("Consulting", r"\bconsulting\b"),
    ])
});

static CERTIFICATIONS: Lazy<Vec<Term>> = Lazy::new(|| {
    vocabulary(&[
        ("AWS Certified", r"\baws\s+certifi"),
        ("Azure Certified", r"\bazure\s+certifi|\baz-\d{3}\b"),
        ("Google Cloud Certified", r"\b(?:gcp|google cloud)\s+certifi"),
        ("PMP", r"\bpmp\b|\bproject management professional\b"),
        ("Certified Scrum Master", r"\bscrum\s*master\b|\bcsm\b"),
        ("CISSP", r"\bcissp\b"),
        ("CompTIA Security+", r"\bsecurity\+"),
        ("CKA", r"\bcka\b|\bcertified kubernetes administrator\b"),
        ("Oracle Certified", r"\boracle certified\b"),
        ("Microsoft Certified", r"\bmicrosoft certified\b"),
    ])
});

/// Vocabulary names in order of first appearance in `text`.
fn scan(vocab: &[Term], text: &str) -> Vec<String> {
    let mut hits: Vec<(usize, &'static str)> = vocab
        .iter()
        .filter_map(|t| t.pattern.find(text).map(|m| (m.start(), t.name)))
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, name)| name.to_string()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Line patterns
// ────────────────────────────────────────────────────────────────────────────

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extraction regex")
}

static HEADING: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)^(?:professional |technical |work |key |core |preferred |academic )?(?:summary|profile|objective|about me|about|experience|employment history|education|background|skills|competencies|certifications?|certificates|licenses|projects|achievements|awards|honou?rs|responsibilities|requirements|qualifications|nice to have|contact(?: information)?)\s*:?$")
});
static SUMMARY_HEADING: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)^(?:professional |career )?(?:summary|profile|objective|about me)\b\s*:?\s*")
});
static TITLE_WORD: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:engineer|developer|manager|analyst|specialist|consultant|coordinator|lead|architect|designer|scientist|administrator|director|officer|intern)\b")
});
static PROJECT_LINE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:projects?|responsib\w*|achieved|developed|implemented|managed|led|created|designed|built|delivered|launched|migrated|optimi[sz]ed|automated)\b")
});
static ACHIEVEMENT_LINE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:awards?|awarded|achievements?|recognition|recogni[sz]ed|honou?rs?|medal|winner|won|champion|excellence|outstanding)\b")
});
static CERTIFICATION_LINE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(?:certifi\w*|accredited)"));
static EDUCATION_LINE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:bachelor\w*|master's|masters? (?:of|in|degree)|ph\.?\s?d|doctorate|degree|university|college|institute|b\.?\s?tech|m\.?\s?tech|b\.?\s?sc|m\.?\s?sc|mba|diploma)\b")
});
static EMAIL: Lazy<Regex> =
    Lazy::new(|| re(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"));
static PHONE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?:\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b")
});
static LINKEDIN: Lazy<Regex> = Lazy::new(|| re(r"(?i)linkedin\.com/in/[\w-]+"));

static EXPLICIT_YEARS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"(?i)(\d{1,2}(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\.?\s*(?:of\s+)?(?:professional\s+|industry\s+|work\s+|relevant\s+|hands-on\s+)?experience"),
        re(r"(?i)experience\s*(?:of|:)?\s*(\d{1,2}(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)"),
    ]
});
static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|—|to)\s*(?:[a-z]{3,9}\.?\s+)?((?:19|20)\d{2}|present|current|now)\b")
});
static REQUIRED_YEARS: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)(\d{1,2}(?:\.\d+)?)\s*(?:\+|plus)?\s*(?:(?:-|–|to)\s*\d{1,2}\s*)?\+?\s*(?:years?|yrs?)")
});

fn strip_bullet(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['•', '-', '*', '·', '–', '●', '▪', '>'])
        .trim()
}

fn is_heading(line: &str) -> bool {
    HEADING.is_match(line.trim())
}

/// Non-heading lines matching `pattern` whose length falls in `[min, max)`.
fn matching_lines(lines: &[&str], pattern: &Regex, min: usize, max: usize, limit: usize) -> Vec<String> {
    lines
        .iter()
        .map(|l| strip_bullet(l))
        .filter(|l| !is_heading(l))
        .filter(|l| (min..max).contains(&l.chars().count()))
        .filter(|l| pattern.is_match(l))
        .take(limit)
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate
// ────────────────────────────────────────────────────────────────────────────

pub fn candidate_profile(text: &str, current_year: i32) -> CandidateProfile {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let total_experience = total_experience(text, current_year);
    let job_titles = job_titles(&lines);
    let seniority = seniority(total_experience, &job_titles);

    CandidateProfile {
        summary: summary(&lines),
        total_experience,
        relevant_experience: total_experience,
        technical_skills: scan(&TECH_SKILLS, text),
        soft_skills: scan(&SOFT_SKILLS, text),
        tools: scan(&TOOLS, text),
        certifications: matching_lines(&lines, &CERTIFICATION_LINE, 6, 200, usize::MAX),
        education: matching_lines(&lines, &EDUCATION_LINE, 10, 200, usize::MAX),
        job_titles,
        projects: matching_lines(&lines, &PROJECT_LINE, 20, 500, MAX_PROJECTS),
        achievements: matching_lines(&lines, &ACHIEVEMENT_LINE, 10, 200, usize::MAX),
        domain_experience: scan(&DOMAINS, text),
        contact_info: contact_info(text),
        keywords: frequent_terms(text, MAX_CANDIDATE_KEYWORDS),
        seniority,
    }
}

/// Explicit statements ("6 years of experience") win; otherwise the union of
/// employment date ranges, capped at 50 years.
pub fn total_experience(text: &str, current_year: i32) -> f64 {
    let explicit = EXPLICIT_YEARS
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |a| a.max(y))));
    if let Some(years) = explicit {
        return years.min(MAX_YEARS);
    }

    let mut ranges: Vec<(i32, i32)> = DATE_RANGE
        .captures_iter(text)
        .filter_map(|c| {
            let start: i32 = c.get(1)?.as_str().parse().ok()?;
            let end_raw = c.get(2)?.as_str();
            let end = end_raw.parse().unwrap_or(current_year).min(current_year);
            (start <= end).then_some((start, end))
        })
        .collect();
    ranges.sort_unstable();

    let mut total = 0;
    let mut current: Option<(i32, i32)> = None;
    for (start, end) in ranges {
        current = match current {
            Some((s, e)) if start <= e => Some((s, e.max(end))),
            Some((s, e)) => {
                total += e - s;
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((s, e)) = current {
        total += e - s;
    }

    (total as f64).min(MAX_YEARS)
}

fn summary(lines: &[&str]) -> String {
    for (i, line) in lines.iter().enumerate() {
        if let Some(m) = SUMMARY_HEADING.find(line) {
            let inline = line[m.end()..].trim();
            if inline.chars().count() > 20 {
                return inline.to_string();
            }
            let body: Vec<&str> = lines
                .iter()
                .skip(i + 1)
                .take(3)
                .copied()
                .take_while(|l| !is_heading(l))
                .filter(|l| l.chars().count() > 20)
                .take(2)
                .collect();
            if !body.is_empty() {
                return body.join(" ");
            }
        }
    }

    lines
        .iter()
        .take(10)
        .filter(|l| l.chars().count() > 30)
        .filter(|l| !EMAIL.is_match(l) && !PHONE.is_match(l))
        .filter(|l| !is_heading(l))
        .take(2)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The part of a line before the employer or dates, when it names a role.
fn job_titles(lines: &[&str]) -> Vec<String> {
    let titles = lines
        .iter()
        .map(|l| strip_bullet(l))
        .filter(|l| !is_heading(l))
        .filter(|l| !CERTIFICATION_LINE.is_match(l) && !EDUCATION_LINE.is_match(l))
        .filter_map(|line| {
            let head = line.split(['|', '(', ',']).next()?;
            let head = head
                .split(" at ")
                .next()?
                .split(" - ")
                .next()?
                .split(" – ")
                .next()?
                .trim();
            let words = head.split_whitespace().count();
            ((1..=6).contains(&words) && head.chars().count() >= 5 && TITLE_WORD.is_match(head))
                .then(|| head.to_string())
        })
        .collect();
    let mut titles = clean_list(titles);
    titles.truncate(MAX_TITLES);
    titles
}

fn seniority(years: f64, titles: &[String]) -> String {
    let titles = titles.join(" ").to_lowercase();
    let senior_title = ["senior", "lead", "manager", "principal", "head", "staff"]
        .iter()
        .any(|w| titles.contains(w));
    if years >= 8.0 || senior_title {
        "Senior"
    } else if years >= 3.0 || titles.contains("mid") {
        "Mid"
    } else {
        "Junior"
    }
    .to_string()
}

fn contact_info(text: &str) -> BTreeMap<String, String> {
    let mut contact = BTreeMap::new();
    if let Some(m) = EMAIL.find(text) {
        contact.insert("email".to_string(), m.as_str().to_string());
    }
    if let Some(m) = PHONE.find(text) {
        contact.insert("phone".to_string(), m.as_str().trim().to_string());
    }
    if let Some(m) = LINKEDIN.find(text) {
        contact.insert("linkedin".to_string(), m.as_str().to_string());
    }
    contact
}

const GENERIC_TERMS: &[&str] = &[
    "experience", "years", "year", "team", "teams", "work", "worked", "role", "company",
    "responsible", "responsibilities", "skills", "ability", "strong", "good", "excellent",
    "knowledge", "also", "well", "like", "have", "has", "more", "able", "looking", "join",
    "about", "must", "should", "required", "preferred", "requirements", "candidate", "including",
    "plus", "nice", "present", "current", "email", "phone", "com", "www", "https",
];

/// Tokens appearing at least twice, most frequent first, ties by first appearance.
fn frequent_terms(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (pos, token) in tokenize(text).into_iter().enumerate() {
        if token.len() < 3 || token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if GENERIC_TERMS.contains(&token.as_str()) {
            continue;
        }
        counts.entry(token).or_insert((0, pos)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= 2)
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(limit).map(|(t, _, _)| t).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Job description
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    General,
    Required,
    Preferred,
    Responsibilities,
}

static PREFERRED_MARKER: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:preferred|nice[\s-]to[\s-]have|good[\s-]to[\s-]have|bonus|(?:is |are )?a plus|desirable|optional)\b")
});
static REQUIRED_MARKER: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:required|requirements|mandatory|must[\s-]have|essential|qualifications|what you bring|you have)\b")
});
static RESPONSIBILITY_MARKER: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:responsibilities|what you(?:'ll| will) do|duties|your role|day[\s-]to[\s-]day)\b")
});
static RESPONSIBILITY_LINE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:responsible for|you will|you'll|will be|duties include)\b")
});
static DEGREE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:bachelor\w*|master'?s?|ph\.?\s?d|doctorate|degree|b\.?\s?tech|m\.?\s?tech|mba|diploma|graduate)\b")
});
static CLAUSE_SPLIT: Lazy<Regex> = Lazy::new(|| re(r"[.;]\s+"));

/// Splits the JD into clauses tagged with the section they fall under. A clause that
/// names a section switches to it for itself and for what follows.
fn sectioned_clauses(text: &str) -> Vec<(Section, String)> {
    let mut section = Section::General;
    let mut out = Vec::new();
    for line in text.lines() {
        for clause in CLAUSE_SPLIT.split(line) {
            let clause = strip_bullet(clause).trim_end_matches('.');
            if clause.is_empty() {
                continue;
            }
            if PREFERRED_MARKER.is_match(clause) {
                section = Section::Preferred;
            } else if REQUIRED_MARKER.is_match(clause) {
                section = Section::Required;
            } else if RESPONSIBILITY_MARKER.is_match(clause) {
                section = Section::Responsibilities;
            }
            out.push((section, clause.to_string()));
        }
    }
    out
}

pub fn job_profile(text: &str) -> JobProfile {
    let clauses = sectioned_clauses(text);

    let mut mandatory = Vec::new();
    let mut preferred = Vec::new();
    for (section, clause) in &clauses {
        let hits = scan(&TECH_SKILLS, clause);
        if *section == Section::Preferred {
            preferred.extend(hits);
        } else {
            mandatory.extend(hits);
        }
    }
    let mandatory_skills = clean_list(mandatory);
    let mandatory_lower: Vec<String> = mandatory_skills.iter().map(|s| s.to_lowercase()).collect();
    let good_to_have_skills = clean_list(
        preferred
            .into_iter()
            .filter(|s| !mandatory_lower.contains(&s.to_lowercase()))
            .collect(),
    );

    let responsibilities: Vec<String> = clauses
        .iter()
        .filter(|(section, clause)| {
            *section == Section::Responsibilities || RESPONSIBILITY_LINE.is_match(clause)
        })
        .map(|(_, clause)| clause.as_str())
        .filter(|c| !is_heading(c) && (20..500).contains(&c.chars().count()))
        .take(MAX_RESPONSIBILITIES)
        .map(str::to_string)
        .collect();

    let education_requirements: Vec<String> = clauses
        .iter()
        .map(|(_, clause)| clause.as_str())
        .filter(|c| DEGREE_CLAUSE.is_match(c) && c.chars().count() <= 200)
        .take(MAX_EDUCATION_REQUIREMENTS)
        .map(str::to_string)
        .collect();

    let required_tools = scan(&TOOLS, text);
    let required_domains = scan(&DOMAINS, text);

    let mut keywords: Vec<String> = mandatory_skills
        .iter()
        .chain(required_tools.iter())
        .chain(required_domains.iter())
        .cloned()
        .collect();
    keywords.extend(frequent_terms(text, MAX_JOB_KEYWORDS));
    let mut keywords = clean_list(keywords);
    keywords.truncate(MAX_JOB_KEYWORDS);

    JobProfile {
        mandatory_skills,
        good_to_have_skills,
        required_experience: required_experience(text),
        required_tools,
        responsibilities,
        education_requirements,
        preferred_certifications: scan(&CERTIFICATIONS, text),
        required_domains,
        keywords,
    }
}

/// Largest "N years" figure in the JD; a range contributes its lower bound.
pub fn required_experience(text: &str) -> f64 {
    REQUIRED_YEARS
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .filter(|y| *y <= 30.0)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "\
Jane Doe
jane.doe@example.com | +1 555-123-4567 | linkedin.com/in/janedoe

Professional Summary
Backend engineer with 6 years of experience building payment systems in FinTech.
Focused on reliability, observability and clean APIs.

Experience
Senior Backend Engineer | Acme Payments | 2020 - Present
• Designed and built a Rust ledger service processing 2M transactions per day
• Led a team of four engineers migrating services to Kubernetes
Software Developer at Globex, 2017 - 2020
• Developed REST APIs in Python and Django backed by PostgreSQL

Skills
Rust, Python, Django, PostgreSQL, Docker, Kubernetes, Git, Jira, communication, mentoring

Education
B.Tech in Computer Science, State University, 2017

Certifications
AWS Certified Solutions Architect - Associate

Awards
Winner, company hackathon 2021";

    const JD: &str = "\
Senior Backend Engineer

Responsibilities:
- Design and build backend services for our payments platform
- You will mentor engineers and review code

Requirements:
- 5+ years of experience with Rust or Python
- Strong PostgreSQL and Docker skills
- Bachelor's degree in Computer Science or related field

Nice to have:
- Kafka, GraphQL
- AWS Certified Solutions Architect";

    #[test]
    fn test_candidate_skills_tools_and_domains() {
        let p = candidate_profile(RESUME, 2024);
        for skill in ["Rust", "Python", "Django", "PostgreSQL", "Docker", "Kubernetes", "REST API"] {
            assert!(p.technical_skills.contains(&skill.to_string()), "missing {skill}");
        }
        assert!(p.tools.contains(&"Git".to_string()));
        assert!(p.tools.contains(&"Jira".to_string()));
        assert!(p.soft_skills.contains(&"Communication".to_string()));
        assert!(p.soft_skills.contains(&"Leadership".to_string()));
        assert_eq!(p.domain_experience, vec!["FinTech".to_string()]);
    }

    #[test]
    fn test_candidate_experience_and_seniority() {
        let p = candidate_profile(RESUME, 2024);
        assert_eq!(p.total_experience, 6.0);
        assert_eq!(p.relevant_experience, 6.0);
        assert_eq!(p.seniority, "Senior");
    }

    #[test]
    fn test_candidate_lines() {
        let p = candidate_profile(RESUME, 2024);
        assert_eq!(
            p.job_titles,
            vec!["Senior Backend Engineer".to_string(), "Software Developer".to_string()]
        );
        assert_eq!(p.education, vec!["B.Tech in Computer Science, State University, 2017".to_string()]);
        assert_eq!(
            p.certifications,
            vec!["AWS Certified Solutions Architect - Associate".to_string()]
        );
        assert!(p.achievements.iter().any(|a| a.contains("hackathon")));
        assert!(p.projects.iter().any(|l| l.contains("ledger service")));
        assert!(p.summary.starts_with("Backend engineer with 6 years"));
    }

    #[test]
    fn test_candidate_contact_info() {
        let p = candidate_profile(RESUME, 2024);
        assert_eq!(p.contact_info.get("email").unwrap(), "jane.doe@example.com");
        assert!(p.contact_info.get("phone").unwrap().contains("555-123-4567"));
        assert_eq!(p.contact_info.get("linkedin").unwrap(), "linkedin.com/in/janedoe");
    }

    #[test]
    fn test_experience_from_date_ranges_merges_overlaps() {
        let text = "Engineer 2015 - 2018\nConsultant 2017 to 2019\nLead Jan 2021 - Present";
        // 2015..2019 = 4, 2021..2024 = 3
        assert_eq!(total_experience(text, 2024), 7.0);
        assert_eq!(total_experience("no dates here", 2024), 0.0);
    }

    #[test]
    fn test_explicit_experience_wins_over_dates() {
        let text = "Over 3.5 years of professional experience. Acme 2010 - 2024";
        assert_eq!(total_experience(text, 2024), 3.5);
    }

    #[test]
    fn test_job_sections_split_mandatory_and_preferred() {
        let job = job_profile(JD);
        assert!(job.mandatory_skills.contains(&"Rust".to_string()));
        assert!(job.mandatory_skills.contains(&"PostgreSQL".to_string()));
        assert!(job.good_to_have_skills.contains(&"Kafka".to_string()));
        assert!(job.good_to_have_skills.contains(&"GraphQL".to_string()));
        assert!(!job.mandatory_skills.contains(&"Kafka".to_string()));
    }

    #[test]
    fn test_job_experience_education_and_certs() {
        let job = job_profile(JD);
        assert_eq!(job.required_experience, 5.0);
        assert_eq!(
            job.education_requirements,
            vec!["Bachelor's degree in Computer Science or related field".to_string()]
        );
        assert_eq!(job.preferred_certifications, vec!["AWS Certified".to_string()]);
        assert!(job.required_tools.contains(&"Docker".to_string()));
    }

    #[test]
    fn test_job_responsibilities() {
        let job = job_profile(JD);
        assert!(job
            .responsibilities
            .contains(&"Design and build backend services for our payments platform".to_string()));
        assert!(job
            .responsibilities
            .contains(&"You will mentor engineers and review code".to_string()));
        assert!(!job.responsibilities.iter().any(|r| r.starts_with("Responsibilities")));
    }

    #[test]
    fn test_required_experience_takes_range_lower_bound() {
        assert_eq!(required_experience("3-5 years in backend development"), 3.0);
        assert_eq!(required_experience("minimum 2 yrs, ideally 4+ years"), 4.0);
        assert_eq!(required_experience("no number here"), 0.0);
    }

    #[test]
    fn test_rule_extraction_matches_scoring_end_to_end() {
        let candidate = candidate_profile(RESUME, 2024);
        let job = job_profile(JD);
        let result = crate::screening::scoring::score(&candidate, &job).unwrap();
        assert!(result.score_breakdown.missing_skills.is_empty());
        assert_eq!(result.score_breakdown.education_score, 100.0);
        assert_eq!(result.score_breakdown.experience_score, 100.0);
    }

    #[tokio::test]
    async fn test_extractor_rejects_empty_profile() {
        let err = RuleBasedExtractor
            .extract_candidate("lorem ipsum dolor sit amet")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
