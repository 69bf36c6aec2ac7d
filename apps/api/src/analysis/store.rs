use chrono::Utc;
use sqlx::{types::Json, SqlitePool};
use tracing::info;

use crate::models::analysis::{AnalysisRow, NewAnalysis};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appends one analysis row and returns it with its assigned id and date.
/// CRITICAL: append-only. Rows are never updated or deleted here.
pub async fn insert_analysis(
    pool: &SqlitePool,
    new: NewAnalysis<'_>,
) -> Result<AnalysisRow, sqlx::Error> {
    let date = Utc::now().format(DATE_FORMAT).to_string();

    let row = sqlx::query_as::<_, AnalysisRow>(
        r#"
        INSERT INTO analyses (course_name, major, level, score, matched, missing, date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, course_name, major, level, score, matched, missing, date
        "#,
    )
    .bind(new.course_name)
    .bind(new.major)
    .bind(new.level)
    .bind(new.score)
    .bind(Json(new.matched))
    .bind(Json(new.missing))
    .bind(date)
    .fetch_one(pool)
    .await?;

    info!(
        "Stored analysis {} for '{}' ({} / {})",
        row.id, row.course_name, row.major, row.level
    );
    Ok(row)
}

/// All analyses, most recent first.
pub async fn list_analyses(pool: &SqlitePool) -> Result<Vec<AnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, AnalysisRow>("SELECT * FROM analyses ORDER BY id DESC")
        .fetch_all(pool)
        .await
}

pub async fn find_analysis(pool: &SqlitePool, id: i64) -> Result<Option<AnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, AnalysisRow>("SELECT * FROM analyses WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}
