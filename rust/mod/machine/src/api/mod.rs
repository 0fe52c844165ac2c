mod extract;
pub mod machines;
pub mod qc;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;

use shopfloor_core::ServiceError;

pub(crate) use extract::{ApiJson, ApiMultipart};

use crate::model::Upload;
use crate::service::documents::DocumentContent;
use crate::service::MachineService;

/// Shared application state.
pub type AppState = Arc<MachineService>;

/// Build the machine/QC API router.
pub fn router(state: AppState) -> Router {
    let limit = state.config().max_upload_bytes;
    Router::new()
        .merge(machines::routes())
        .merge(qc::routes())
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

pub(crate) fn ok_json<T: Serialize>(result: Result<T, ServiceError>) -> Result<Json<T>, ServiceError> {
    result.map(Json)
}

pub(crate) fn created<T: Serialize>(
    result: Result<T, ServiceError>,
) -> Result<(StatusCode, Json<T>), ServiceError> {
    result.map(|v| (StatusCode::CREATED, Json(v)))
}

/// How a stored PDF is offered to the browser.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Disposition {
    Inline,
    Attachment,
}

pub(crate) fn pdf_response(content: DocumentContent, disposition: Disposition) -> Response {
    let kind = match disposition {
        Disposition::Inline => "inline",
        Disposition::Attachment => "attachment",
    };
    let name = content.file_name.replace(['"', '\\'], "_");
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{}; filename=\"{}\"", kind, name),
            ),
        ],
        content.bytes,
    )
        .into_response()
}

/// Text fields and file parts of one multipart request.
#[derive(Debug, Default)]
pub(crate) struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Drain the request. Parts named in `file_fields` are kept as binary
    /// uploads, everything else is read as text. Non-text unknown parts are
    /// skipped.
    pub async fn read(mut multipart: Multipart, file_fields: &[&str]) -> Result<Self, ServiceError> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if file_fields.contains(&name.as_str()) {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_err)?;
                form.files.insert(
                    name,
                    Upload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    },
                );
            } else if let Ok(text) = field.text().await {
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

fn multipart_err(e: axum::extract::multipart::MultipartError) -> ServiceError {
    extract::body_error(e.status(), &e.body_text())
}

/// Read the single PDF part `field` of an upload request.
pub(crate) async fn read_upload(multipart: Multipart, field: &str) -> Result<Upload, ServiceError> {
    let mut form = MultipartForm::read(multipart, &[field]).await?;
    form.take_file(field)
        .ok_or_else(|| ServiceError::MissingDocument(format!("multipart field `{}` is required", field)))
}
