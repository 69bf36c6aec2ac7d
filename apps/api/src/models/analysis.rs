use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// One stored analysis. Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: i64,
    pub course_name: String,
    pub major: String,
    pub level: String,
    pub score: f64,
    pub matched: Json<Vec<String>>,
    pub missing: Json<Vec<String>>,
    /// UTC, `%Y-%m-%d %H:%M:%S`
    pub date: String,
}

/// Values for a new row; `id` and `date` are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewAnalysis<'a> {
    pub course_name: &'a str,
    pub major: &'a str,
    pub level: &'a str,
    pub score: f64,
    pub matched: &'a [String],
    pub missing: &'a [String],
}
