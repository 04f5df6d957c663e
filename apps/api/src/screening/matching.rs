//! Term normalization and matching shared by every scoring category.
//!
//! Two terms match when their canonical forms are equal. The canonical form is the
//! lowercased, whitespace-collapsed term, mapped through a fixed synonym table
//! (`ML` and `Machine Learning` are the same skill).

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Alias → canonical form. Both sides are already normalized.
static SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("ml", "machine learning"),
        ("ai", "artificial intelligence"),
        ("dl", "deep learning"),
        ("nlp", "natural language processing"),
        ("js", "javascript"),
        ("ecmascript", "javascript"),
        ("ts", "typescript"),
        ("nodejs", "node.js"),
        ("node", "node.js"),
        ("node js", "node.js"),
        ("reactjs", "react"),
        ("react.js", "react"),
        ("react js", "react"),
        ("angularjs", "angular"),
        ("angular.js", "angular"),
        ("vuejs", "vue"),
        ("vue.js", "vue"),
        ("py", "python"),
        ("python3", "python"),
        ("golang", "go"),
        ("cpp", "c++"),
        ("csharp", "c#"),
        ("postgres", "postgresql"),
        ("mongo", "mongodb"),
        ("k8s", "kubernetes"),
        ("tf", "tensorflow"),
        ("sklearn", "scikit-learn"),
        ("springboot", "spring boot"),
        ("amazon web services", "aws"),
        ("google cloud", "gcp"),
        ("google cloud platform", "gcp"),
        ("microsoft azure", "azure"),
        ("cicd", "ci/cd"),
        ("ci cd", "ci/cd"),
        ("restful", "rest api"),
        ("rest", "rest api"),
        ("restful api", "rest api"),
        ("oop", "object-oriented programming"),
    ]
    .into_iter()
    .collect()
});

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is",
        "it", "its", "of", "on", "or", "our", "the", "this", "that", "to", "we", "will",
        "with", "you", "your", "using", "across", "within", "etc", "other", "all", "any",
        "new", "work", "working", "including",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, trim, collapse inner whitespace.
pub fn normalize(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized term mapped through the synonym table.
pub fn canonical(term: &str) -> String {
    let normalized = normalize(term);
    match SYNONYMS.get(normalized.as_str()) {
        Some(canon) => (*canon).to_string(),
        None => normalized,
    }
}

/// Set of canonical terms for repeated membership checks.
#[derive(Debug, Default)]
pub struct TermIndex {
    terms: HashSet<String>,
}

impl TermIndex {
    pub fn new<'a, I>(terms: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| canonical(t))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(&canonical(term))
    }
}

/// Splits `required` into (matched, missing), both in the input order.
pub fn partition<'a>(required: &'a [String], index: &TermIndex) -> (Vec<String>, Vec<String>) {
    let (matched, missing): (Vec<&'a String>, Vec<&'a String>) =
        required.iter().partition(|term| index.contains(term));
    (
        matched.into_iter().cloned().collect(),
        missing.into_iter().cloned().collect(),
    )
}

/// Lowercase word tokens. `+` and `#` stay inside a token so `C++` and `C#` survive;
/// single characters and stop words are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

pub fn token_set<'a, I>(texts: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    texts.into_iter().flat_map(|t| tokenize(t)).collect()
}

/// True when every token of `needle` appears in `haystack_tokens`.
/// Used for free-text requirements ("Computer Science degree") against entries.
pub fn all_tokens_present(needle: &str, haystack_tokens: &HashSet<String>) -> bool {
    let tokens = tokenize(needle);
    !tokens.is_empty() && tokens.iter().all(|t| haystack_tokens.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms_match(a: &str, b: &str) -> bool {
        canonical(a) == canonical(b)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_is_case_and_space_insensitive() {
        assert_eq!(normalize("  Machine   Learning "), "machine learning");
        assert!(terms_match("REACT", "react"));
    }

    #[test]
    fn test_synonyms_resolve_both_directions() {
        assert!(terms_match("ML", "Machine Learning"));
        assert!(terms_match("Machine Learning", "ml"));
        assert!(terms_match("k8s", "Kubernetes"));
        assert!(terms_match("ReactJS", "React"));
        assert!(terms_match("Postgres", "PostgreSQL"));
        assert!(!terms_match("Java", "JavaScript"));
    }

    #[test]
    fn test_partition_preserves_order() {
        let required = strings(&["React", "TypeScript", "GraphQL"]);
        let candidate = strings(&["graphql", "react"]);
        let index = TermIndex::new(&candidate);

        let (matched, missing) = partition(&required, &index);
        assert_eq!(matched, strings(&["React", "GraphQL"]));
        assert_eq!(missing, strings(&["TypeScript"]));
    }

    #[test]
    fn test_tokenize_keeps_language_symbols() {
        let tokens = tokenize("Build services in C++ and C# with the team");
        assert!(tokens.contains(&"c++".to_string()));
        assert!(tokens.contains(&"c#".to_string()));
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"in".to_string()));
    }

    #[test]
    fn test_all_tokens_present() {
        let haystack = token_set(&strings(&["B.Sc. in Computer Science, 2018"]));
        assert!(all_tokens_present("Computer Science", &haystack));
        assert!(!all_tokens_present("Electrical Engineering", &haystack));
        assert!(!all_tokens_present("", &haystack));
    }
}
