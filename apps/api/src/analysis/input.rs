//! Input acquisition: turns a multipart form or JSON body into analysis input,
//! and resolves exactly one text source (typed text or an uploaded PDF).

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::taxonomy::{ProficiencyLevel, TaxonomyError};

pub const DEFAULT_COURSE_NAME: &str = "Untitled Course";

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Provide either course text or a PDF document")]
    NoInput,

    #[error("Provide course text or a PDF document, not both")]
    BothInputs,

    #[error("The uploaded document is not a readable PDF: {0}")]
    UnreadableDocument(String),

    #[error("No text could be extracted from the uploaded document")]
    EmptyDocument,

    #[error("Malformed form data: {0}")]
    Multipart(String),

    #[error("The request body exceeds the upload limit")]
    TooLarge,

    #[error("Unsupported content type '{0}'. Use multipart/form-data or application/json")]
    UnsupportedContentType(String),
}

/// Raw analyze request, before any validation beyond "major is present".
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub major: String,
    pub course_name: Option<String>,
    pub level: Option<String>,
    pub text: Option<String>,
    pub document: Option<Bytes>,
}

#[derive(Debug, Deserialize)]
struct JsonAnalysisInput {
    major: Option<String>,
    course_name: Option<String>,
    level: Option<String>,
    text: Option<String>,
}

impl AnalysisInput {
    pub fn course_name(&self) -> &str {
        non_blank(self.course_name.as_deref()).unwrap_or(DEFAULT_COURSE_NAME)
    }

    /// Requested level, defaulting to the lowest one.
    pub fn level(&self) -> Result<ProficiencyLevel, TaxonomyError> {
        non_blank(self.level.as_deref())
            .map(str::parse::<ProficiencyLevel>)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Returns the text to analyze. Exactly one of typed text or document must
    /// be non-empty; a document is run through PDF text extraction.
    pub async fn resolve_text(&self) -> Result<String, InputError> {
        let text = non_blank(self.text.as_deref());
        let document = self.document.as_ref().filter(|d| !d.is_empty());

        match (text, document) {
            (Some(_), Some(_)) => Err(InputError::BothInputs),
            (None, None) => Err(InputError::NoInput),
            (Some(text), None) => Ok(text.to_string()),
            (None, Some(document)) => {
                let extracted = extract_pdf_text(document.clone()).await?;
                if extracted.trim().is_empty() {
                    return Err(InputError::EmptyDocument);
                }
                Ok(extracted)
            }
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, InputError> {
        let mut major = None;
        let mut input = AnalysisInput::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| form_error(e.status(), e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "document" => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| form_error(e.status(), e.body_text()))?;
                    input.document = Some(bytes);
                }
                "major" | "course_name" | "level" | "text" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| form_error(e.status(), e.body_text()))?;
                    match name.as_str() {
                        "major" => major = Some(value),
                        "course_name" => input.course_name = Some(value),
                        "level" => input.level = Some(value),
                        _ => input.text = Some(value),
                    }
                }
                other => debug!("Ignoring unknown form field '{other}'"),
            }
        }

        input.major = require_major(major)?;
        Ok(input)
    }

    fn from_json(body: JsonAnalysisInput) -> Result<Self, InputError> {
        Ok(AnalysisInput {
            major: require_major(body.major)?,
            course_name: body.course_name,
            level: body.level,
            text: body.text,
            document: None,
        })
    }
}

#[async_trait]
impl<S> FromRequest<S> for AnalysisInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| form_error(e.status(), e.body_text()))?;
            Ok(Self::from_multipart(multipart).await?)
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<JsonAnalysisInput>::from_request(req, state)
                .await
                .map_err(|e| match e.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => AppError::from(InputError::TooLarge),
                    _ => AppError::Validation(e.body_text()),
                })?;
            Ok(Self::from_json(body)?)
        } else {
            Err(InputError::UnsupportedContentType(content_type).into())
        }
    }
}

/// Extracts the text of every page and concatenates it. Pages without a text
/// layer contribute nothing. Runs on the blocking pool; a panic inside the PDF
/// parser surfaces as `UnreadableDocument`.
pub async fn extract_pdf_text(document: Bytes) -> Result<String, InputError> {
    if !document.starts_with(b"%PDF-") {
        return Err(InputError::UnreadableDocument(
            "missing %PDF header".to_string(),
        ));
    }

    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&document))
        .await
        .map_err(|e| InputError::UnreadableDocument(format!("parser aborted: {e}")))?
        .map_err(|e| InputError::UnreadableDocument(format!("{e:?}")))
}

/// Body-limit rejections keep their 413; anything else is malformed input.
fn form_error(status: StatusCode, body_text: String) -> InputError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        InputError::TooLarge
    } else {
        InputError::Multipart(body_text)
    }
}

fn require_major(major: Option<String>) -> Result<String, InputError> {
    non_blank(major.as_deref())
        .map(str::to_string)
        .ok_or(InputError::MissingField("major"))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
