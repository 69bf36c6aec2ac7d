//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::analysis::input::AnalysisInput;
use crate::analysis::report::render_report;
use crate::analysis::scoring::{compute_coverage, recommend};
use crate::analysis::store::{find_analysis, insert_analysis, list_analyses};
use crate::errors::AppError;
use crate::models::analysis::{AnalysisRow, NewAnalysis};
use crate::state::AppState;
use crate::taxonomy::{MajorSkills, ProficiencyLevel};

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: i64,
    pub course_name: String,
    pub major: String,
    pub level: String,
    pub score: f64,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub recommendation: String,
    pub date: String,
}

impl From<AnalysisRow> for AnalysisResponse {
    fn from(row: AnalysisRow) -> Self {
        let recommendation = recommend(row.score, &row.missing.0);
        Self {
            id: row.id,
            course_name: row.course_name,
            major: row.major,
            level: row.level,
            score: row.score,
            matched: row.matched.0,
            missing: row.missing.0,
            recommendation,
            date: row.date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaxonomyResponse {
    pub levels: Vec<&'static str>,
    pub match_strategy: &'static str,
    pub majors: BTreeMap<String, MajorSkills>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses
pub async fn handle_analyze(
    State(state): State<AppState>,
    input: AnalysisInput,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let level = input.level()?;
    let major = state.taxonomy.major(&input.major)?;
    let text = input.resolve_text().await?;

    let expected = major.skills.expected_up_to(level);
    let found = state.matcher.extract(&text, &expected);
    let coverage = compute_coverage(&found, &expected)?;

    let row = insert_analysis(
        &state.db,
        NewAnalysis {
            course_name: input.course_name(),
            major: major.name,
            level: level.as_str(),
            score: coverage.score,
            matched: &coverage.matched,
            missing: &coverage.missing,
        },
    )
    .await?;

    info!(
        "Analysis {}: {} / {} matched {}/{} (score {:.2}, {} matcher)",
        row.id,
        major.name,
        level,
        coverage.matched.len(),
        expected.len(),
        coverage.score,
        state.matcher.name()
    );

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /api/v1/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalysisResponse>>, AppError> {
    let rows = list_analyses(&state.db).await?;
    Ok(Json(rows.into_iter().map(AnalysisResponse::from).collect()))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let row = find_analysis(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;
    Ok(Json(row.into()))
}

/// GET /api/v1/analyses/:id/report
///
/// Unknown ids get a plain-text 404 rather than the JSON error envelope.
pub async fn handle_download_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(row) = find_analysis(&state.db, id).await? else {
        return Ok((StatusCode::NOT_FOUND, format!("Analysis {id} not found")).into_response());
    };

    let pdf = tokio::task::spawn_blocking(move || render_report(&row))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    info!("Rendered report for analysis {id} ({} bytes)", pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"analysis_{id}.pdf\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// GET /api/v1/taxonomy
pub async fn handle_get_taxonomy(
    State(state): State<AppState>,
) -> Result<Json<TaxonomyResponse>, AppError> {
    Ok(Json(TaxonomyResponse {
        levels: ProficiencyLevel::ALL.iter().map(|l| l.as_str()).collect(),
        match_strategy: state.matcher.name(),
        majors: state.taxonomy.majors().clone(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use printpdf::{BuiltinFont, Mm, PdfDocument};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::extractor::MatchStrategy;
    use crate::config::Config;
    use crate::db::test_pool;
    use crate::routes::build_router;
    use crate::taxonomy::SkillTaxonomy;

    const BOUNDARY: &str = "skillmap-test-boundary";

    async fn app_with(taxonomy: SkillTaxonomy) -> Router {
        app_with_limit(taxonomy, 1024 * 1024).await
    }

    async fn app_with_limit(taxonomy: SkillTaxonomy, max_upload_bytes: usize) -> Router {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            skill_taxonomy_path: None,
            match_strategy: MatchStrategy::Phrase,
            max_upload_bytes,
        };
        let state = AppState {
            db: test_pool().await,
            matcher: Arc::from(config.match_strategy.matcher()),
            config,
            taxonomy: Arc::new(taxonomy),
        };
        build_router(state)
    }

    async fn app() -> Router {
        app_with(SkillTaxonomy::builtin()).await
    }

    fn json_request(body: Value) -> Request<Body> {
        Request::post("/api/v1/analyses")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::post("/api/v1/analyses")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    /// Multipart request carrying `major` and a PDF `document` part.
    fn document_request(major: &str, pdf: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"major\"\r\n\r\n{major}\r\n\
             --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"course.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(pdf);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::post("/api/v1/analyses")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    /// One-page PDF with one text line per entry; no entries means no text layer.
    fn pdf_with_lines(lines: &[&str]) -> Vec<u8> {
        let (doc, page, layer) = PdfDocument::new("course", Mm(210.0), Mm(297.0), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();
        let layer = doc.get_page(page).get_layer(layer);
        for (i, line) in lines.iter().enumerate() {
            layer.use_text(*line, 12.0, Mm(20.0), Mm(270.0 - 10.0 * i as f32), &font);
        }
        doc.save_to_bytes().unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_analyze_it_basic_example() {
        let app = app().await;
        let (status, body) = send_json(
            &app,
            json_request(json!({
                "major": "IT",
                "level": "Basic",
                "course_name": "Intro",
                "text": "I know python and sql well"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["score"], json!(50.0));
        assert_eq!(body["matched"], json!(["python", "sql"]));
        assert_eq!(body["missing"], json!(["programming", "data analysis"]));
        assert_eq!(
            body["recommendation"],
            json!("Low alignment. Urgent improvement needed in: programming, data analysis.")
        );
        assert_eq!(body["course_name"], json!("Intro"));
        assert!(body["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_analyze_multipart_text_with_defaults() {
        let app = app().await;
        let (status, body) = send_json(
            &app,
            multipart_request(&[
                ("major", "it"),
                ("text", "Python programming, SQL and data analysis"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["major"], json!("IT"));
        assert_eq!(body["level"], json!("Basic"));
        assert_eq!(body["course_name"], json!("Untitled Course"));
        assert_eq!(body["score"], json!(100.0));
        assert_eq!(body["missing"], json!([]));
    }

    #[tokio::test]
    async fn test_analyze_without_text_or_document_is_400() {
        let app = app().await;
        let (status, body) =
            send_json(&app, multipart_request(&[("major", "IT"), ("text", "  ")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("error").is_some());

        let (status, body) = send_json(&app, json_request(json!({ "major": "IT" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn test_analyze_uploaded_pdf_document() {
        let app = app().await;
        let pdf = pdf_with_lines(&["Introduction to Python", "Queries in SQL"]);
        let (status, body) = send_json(&app, document_request("IT", &pdf)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["matched"], json!(["python", "sql"]));
        assert_eq!(body["missing"], json!(["programming", "data analysis"]));
        assert_eq!(body["score"], json!(50.0));
    }

    #[tokio::test]
    async fn test_analyze_pdf_without_text_layer_is_400() {
        let app = app().await;
        let (status, body) = send_json(&app, document_request("IT", &pdf_with_lines(&[]))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
        assert_eq!(
            body["error"]["message"],
            json!("No text could be extracted from the uploaded document")
        );
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let app = app_with_limit(SkillTaxonomy::builtin(), 1000).await;
        let text = "python ".repeat(500);
        let (status, body) =
            send_json(&app, multipart_request(&[("major", "IT"), ("text", &text)])).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], json!("PAYLOAD_TOO_LARGE"));

        let (status, _) = send_json(&app, json_request(json!({ "major": "IT", "text": text }))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_analyze_unknown_major_or_level_is_400() {
        let app = app().await;
        let (status, body) =
            send_json(&app, json_request(json!({ "major": "Art", "text": "python" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));

        let (status, _) = send_json(
            &app,
            json_request(json!({ "major": "IT", "level": "Expert", "text": "python" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_unsupported_content_type_is_400() {
        let app = app().await;
        let request = Request::post("/api/v1/analyses")
            .header("content-type", "text/plain")
            .body(Body::from("python"))
            .unwrap();
        let (status, _) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_empty_level_is_422_not_a_crash() {
        let taxonomy =
            SkillTaxonomy::from_json(r#"{"Design": {"Advanced": ["typography"]}}"#).unwrap();
        let app = app_with(taxonomy).await;
        let (status, body) = send_json(
            &app,
            json_request(json!({ "major": "Design", "text": "typography" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let app = app().await;
        for course in ["First", "Second"] {
            let (status, _) = send_json(
                &app,
                json_request(json!({
                    "major": "Business",
                    "course_name": course,
                    "text": "marketing"
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let request = Request::get("/api/v1/analyses").body(Body::empty()).unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["course_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_get_unknown_analysis_is_404_json() {
        let app = app().await;
        let request = Request::get("/api/v1/analyses/42").body(Body::empty()).unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_report_for_unknown_id_is_plain_404() {
        let app = app().await;
        let request = Request::get("/api/v1/analyses/999/report")
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(String::from_utf8(bytes).unwrap(), "Analysis 999 not found");
    }

    #[tokio::test]
    async fn test_report_download_returns_pdf() {
        let app = app().await;
        let (_, body) = send_json(
            &app,
            json_request(json!({ "major": "IT", "text": "python" })),
        )
        .await;
        let id = body["id"].as_i64().unwrap();

        let request = Request::get(format!("/api/v1/analyses/{id}/report"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"analysis_{id}.pdf\"").as_str()
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_taxonomy_endpoint_lists_majors_and_levels() {
        let app = app().await;
        let request = Request::get("/api/v1/taxonomy").body(Body::empty()).unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["levels"], json!(["Basic", "Intermediate", "Advanced"]));
        assert_eq!(body["match_strategy"], json!("phrase"));
        assert_eq!(
            body["majors"]["IT"]["levels"]["Basic"],
            json!(["python", "programming", "sql", "data analysis"])
        );
    }
}
