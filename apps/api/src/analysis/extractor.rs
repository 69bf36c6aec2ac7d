//! Skill extraction: finds which vocabulary phrases appear in a course description.
//!
//! Pluggable via the `SkillMatcher` trait. `AppState` holds an
//! `Arc<dyn SkillMatcher>` chosen at startup from `MATCH_STRATEGY`:
//!
//! - `PhraseMatcher` (default): token-boundary phrase match. "sql" does not
//!   match inside "mysql".
//! - `SubstringMatcher`: raw lowercase containment. "sql" matches inside "mysql".

use std::fmt;
use std::str::FromStr;

/// Extracts the phrases of `vocabulary` present in `text`.
///
/// Implementations return matches in vocabulary order, each phrase at most once,
/// and never produce partial credit.
pub trait SkillMatcher: Send + Sync {
    fn extract(&self, text: &str, vocabulary: &[String]) -> Vec<String>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchStrategy {
    #[default]
    Phrase,
    Substring,
}

impl MatchStrategy {
    pub fn matcher(self) -> Box<dyn SkillMatcher> {
        match self {
            MatchStrategy::Phrase => Box::new(PhraseMatcher),
            MatchStrategy::Substring => Box::new(SubstringMatcher),
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phrase" => Ok(MatchStrategy::Phrase),
            "substring" => Ok(MatchStrategy::Substring),
            other => Err(format!("unknown match strategy '{other}'")),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Phrase => f.write_str("phrase"),
            MatchStrategy::Substring => f.write_str("substring"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PhraseMatcher
// ────────────────────────────────────────────────────────────────────────────

/// Token-boundary phrase matcher.
///
/// Text and phrases are lowercased and split into tokens: maximal runs of
/// alphanumeric characters, `+` and `#` (so "c++" and "c#" survive). A phrase
/// matches when its token sequence occurs contiguously in the text. Hyphens
/// and other punctuation are separators, so "data-driven" matches "data driven".
pub struct PhraseMatcher;

impl SkillMatcher for PhraseMatcher {
    fn extract(&self, text: &str, vocabulary: &[String]) -> Vec<String> {
        let text_tokens = tokenize(text);
        let mut matched: Vec<String> = Vec::new();

        for phrase in vocabulary {
            if matched.contains(phrase) {
                continue;
            }
            let phrase_tokens = tokenize(phrase);
            if phrase_tokens.is_empty() {
                continue;
            }
            if text_tokens
                .windows(phrase_tokens.len())
                .any(|window| window == phrase_tokens.as_slice())
            {
                matched.push(phrase.clone());
            }
        }

        matched
    }

    fn name(&self) -> &'static str {
        "phrase"
    }
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || c == '+' || c == '#'
}

pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_token_char(c))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// SubstringMatcher
// ────────────────────────────────────────────────────────────────────────────

/// Lowercase containment with no boundary check.
pub struct SubstringMatcher;

impl SkillMatcher for SubstringMatcher {
    fn extract(&self, text: &str, vocabulary: &[String]) -> Vec<String> {
        let text_lower = text.to_lowercase();
        let mut matched: Vec<String> = Vec::new();

        for phrase in vocabulary {
            let phrase_lower = phrase.trim().to_lowercase();
            if phrase_lower.is_empty() || matched.contains(phrase) {
                continue;
            }
            if text_lower.contains(&phrase_lower) {
                matched.push(phrase.clone());
            }
        }

        matched
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}
