use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("No expected skills are configured for this major and level")]
    NoExpectedSkills,
}

/// Coverage of a course description against the expected skill set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCoverage {
    /// 0 – 100, two decimal places
    pub score: f64,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// Percentage of `expected` present in `matched`, rounded to two decimals.
///
/// Only matches that belong to `expected` count, so the result stays within 0 – 100.
pub fn score(matched: &[String], expected: &[String]) -> Result<f64, ScoringError> {
    if expected.is_empty() {
        return Err(ScoringError::NoExpectedSkills);
    }
    let hits = expected.iter().filter(|e| matched.contains(e)).count();
    let raw = 100.0 * hits as f64 / expected.len() as f64;
    Ok(round2(raw))
}

/// Splits `expected` into matched and missing (both in expected order) and scores it.
pub fn compute_coverage(
    matched: &[String],
    expected: &[String],
) -> Result<SkillCoverage, ScoringError> {
    let score = score(matched, expected)?;
    let (matched, missing): (Vec<String>, Vec<String>) = expected
        .iter()
        .cloned()
        .partition(|skill| matched.contains(skill));

    Ok(SkillCoverage {
        score,
        matched,
        missing,
    })
}

/// Canned recommendation for a score.
///
/// - score > 75: high alignment, missing skills not mentioned
/// - 50 < score ≤ 75: names the first three missing skills
/// - score ≤ 50: names every missing skill
pub fn recommend(score: f64, missing: &[String]) -> String {
    if score > 75.0 {
        "Excellent alignment! This course covers the skills expected at this level.".to_string()
    } else if score > 50.0 {
        let top: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();
        format!("Good alignment. Consider strengthening: {}.", top.join(", "))
    } else {
        format!(
            "Low alignment. Urgent improvement needed in: {}.",
            missing.join(", ")
        )
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
