//! Skill taxonomy: major, then proficiency level, then ordered skill phrases.
//!
//! The taxonomy is immutable once built. `AppState` carries it behind an `Arc`
//! so handlers and tests can substitute their own.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::extractor::tokenize;

#[derive(Debug, Error, PartialEq)]
pub enum TaxonomyError {
    #[error("Unknown major '{given}'. Expected one of: {valid}")]
    UnknownMajor { given: String, valid: String },

    #[error("Unknown proficiency level '{0}'. Expected one of: Basic, Intermediate, Advanced")]
    UnknownLevel(String),

    #[error("Invalid taxonomy: {0}")]
    Invalid(String),
}

/// Ordinal proficiency tier. Declaration order is the comparison order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ProficiencyLevel {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 3] = [
        ProficiencyLevel::Basic,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::Basic => "Basic",
            ProficiencyLevel::Intermediate => "Intermediate",
            ProficiencyLevel::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| TaxonomyError::UnknownLevel(s.to_string()))
    }
}

/// Skill phrases for one major, keyed by level.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MajorSkills {
    levels: BTreeMap<ProficiencyLevel, Vec<String>>,
}

impl MajorSkills {
    pub fn at(&self, level: ProficiencyLevel) -> &[String] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ordered union of every level up to and including `level`.
    /// A phrase repeated at a higher level keeps its first position.
    pub fn expected_up_to(&self, level: ProficiencyLevel) -> Vec<String> {
        let mut seen = HashSet::new();
        ProficiencyLevel::ALL
            .into_iter()
            .filter(|l| *l <= level)
            .flat_map(|l| self.at(l).iter())
            .filter(|phrase| seen.insert(phrase.as_str()))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillTaxonomy {
    majors: BTreeMap<String, MajorSkills>,
}

/// A validated major name paired with its skills.
#[derive(Debug, Clone, Copy)]
pub struct MajorRef<'a> {
    pub name: &'a str,
    pub skills: &'a MajorSkills,
}

impl SkillTaxonomy {
    /// Builds a taxonomy, normalizing phrases to trimmed lowercase and rejecting
    /// phrases with no word characters as well as duplicates within a level.
    pub fn new(
        raw: BTreeMap<String, BTreeMap<ProficiencyLevel, Vec<String>>>,
    ) -> Result<Self, TaxonomyError> {
        if raw.is_empty() {
            return Err(TaxonomyError::Invalid("no majors defined".to_string()));
        }

        let mut majors = BTreeMap::new();
        for (major, levels) in raw {
            let major = major.trim().to_string();
            if major.is_empty() {
                return Err(TaxonomyError::Invalid("empty major name".to_string()));
            }
            if majors
                .keys()
                .any(|existing: &String| existing.eq_ignore_ascii_case(&major))
            {
                return Err(TaxonomyError::Invalid(format!(
                    "major '{major}' is defined twice"
                )));
            }

            let mut normalized = BTreeMap::new();
            for (level, phrases) in levels {
                let mut seen = HashSet::new();
                let mut cleaned = Vec::with_capacity(phrases.len());
                for phrase in phrases {
                    let phrase = phrase.trim().to_lowercase();
                    if phrase.is_empty() {
                        return Err(TaxonomyError::Invalid(format!(
                            "empty skill phrase in {major}/{level}"
                        )));
                    }
                    if tokenize(&phrase).is_empty() {
                        return Err(TaxonomyError::Invalid(format!(
                            "skill phrase '{phrase}' in {major}/{level} has no word characters"
                        )));
                    }
                    if !seen.insert(phrase.clone()) {
                        return Err(TaxonomyError::Invalid(format!(
                            "duplicate skill phrase '{phrase}' in {major}/{level}"
                        )));
                    }
                    cleaned.push(phrase);
                }
                normalized.insert(level, cleaned);
            }
            majors.insert(major, MajorSkills { levels: normalized });
        }

        Ok(Self { majors })
    }

    /// Parses `{ "<major>": { "<Level>": ["phrase", ...] } }`.
    pub fn from_json(json: &str) -> Result<Self, TaxonomyError> {
        let raw: BTreeMap<String, BTreeMap<String, Vec<String>>> =
            serde_json::from_str(json).map_err(|e| TaxonomyError::Invalid(e.to_string()))?;

        let mut typed = BTreeMap::new();
        for (major, levels) in raw {
            let mut by_level = BTreeMap::new();
            for (key, phrases) in levels {
                let level = key.parse::<ProficiencyLevel>()?;
                if by_level.insert(level, phrases).is_some() {
                    return Err(TaxonomyError::Invalid(format!(
                        "level '{key}' defined twice in {major}"
                    )));
                }
            }
            typed.insert(major, by_level);
        }
        Self::new(typed)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Case-insensitive major lookup returning the canonical name.
    pub fn major(&self, name: &str) -> Result<MajorRef<'_>, TaxonomyError> {
        let needle = name.trim();
        self.majors
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(needle))
            .map(|(key, skills)| MajorRef {
                name: key.as_str(),
                skills,
            })
            .ok_or_else(|| TaxonomyError::UnknownMajor {
                given: name.to_string(),
                valid: self.major_names().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn majors(&self) -> &BTreeMap<String, MajorSkills> {
        &self.majors
    }

    pub fn major_names(&self) -> impl Iterator<Item = &str> {
        self.majors.keys().map(String::as_str)
    }

    pub fn builtin() -> Self {
        let majors = BUILTIN_TAXONOMY
            .iter()
            .map(|(major, levels)| {
                let levels = levels
                    .iter()
                    .map(|(level, phrases)| {
                        (*level, phrases.iter().map(|p| p.to_string()).collect())
                    })
                    .collect();
                (major.to_string(), MajorSkills { levels })
            })
            .collect();
        Self { majors }
    }
}

impl Default for SkillTaxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

type LevelPhrases = (ProficiencyLevel, &'static [&'static str]);

const BUILTIN_TAXONOMY: &[(&str, &[LevelPhrases])] = &[
    (
        "IT",
        &[
            (
                ProficiencyLevel::Basic,
                &["python", "programming", "sql", "data analysis"],
            ),
            (
                ProficiencyLevel::Intermediate,
                &["machine learning", "git", "web development", "databases"],
            ),
            (
                ProficiencyLevel::Advanced,
                &["cloud computing", "docker", "cybersecurity", "system design"],
            ),
        ],
    ),
    (
        "Business",
        &[
            (
                ProficiencyLevel::Basic,
                &["communication", "accounting", "marketing", "teamwork"],
            ),
            (
                ProficiencyLevel::Intermediate,
                &[
                    "project management",
                    "financial analysis",
                    "business strategy",
                    "negotiation",
                ],
            ),
            (
                ProficiencyLevel::Advanced,
                &[
                    "leadership",
                    "risk management",
                    "data-driven decision making",
                    "entrepreneurship",
                ],
            ),
        ],
    ),
    (
        "Engineering",
        &[
            (
                ProficiencyLevel::Basic,
                &["mathematics", "physics", "technical drawing", "problem solving"],
            ),
            (
                ProficiencyLevel::Intermediate,
                &["cad", "thermodynamics", "circuit analysis", "materials science"],
            ),
            (
                ProficiencyLevel::Advanced,
                &[
                    "control systems",
                    "finite element analysis",
                    "project management",
                    "quality assurance",
                ],
            ),
        ],
    ),
];
