use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use shopfloor_core::ServiceError;

use crate::model::QcForm;
use crate::service::qc::SubmitQcForm;
use super::{created, ok_json, pdf_response, read_upload, ApiJson, ApiMultipart, AppState, Disposition};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/qc", get(list_qc_forms).post(submit_qc_form))
        .route("/api/qc/{id}", get(get_qc_form))
        .route("/api/qc/{id}/pdf", get(view_pdf).post(upload_pdf))
        .route("/api/qc/{id}/pdf/download", get(download_pdf))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QcQuery {
    machine_id: Option<String>,
}

async fn list_qc_forms(
    State(svc): State<AppState>,
    Query(q): Query<QcQuery>,
) -> Result<Json<Vec<QcForm>>, ServiceError> {
    let machine_id = q
        .machine_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ServiceError::Validation("machineId query parameter is required".into()))?;
    ok_json(svc.list_qc_forms(&machine_id))
}

async fn submit_qc_form(
    State(svc): State<AppState>,
    ApiJson(body): ApiJson<SubmitQcForm>,
) -> Result<(StatusCode, Json<QcForm>), ServiceError> {
    created(svc.submit_qc_form(body))
}

async fn get_qc_form(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QcForm>, ServiceError> {
    ok_json(svc.get_qc_form(&id))
}

async fn upload_pdf(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Json<QcForm>, ServiceError> {
    let upload = read_upload(multipart, "pdf").await?;
    ok_json(svc.attach_qc_pdf(&id, upload))
}

async fn view_pdf(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(pdf_response(svc.qc_pdf(&id)?, Disposition::Inline))
}

async fn download_pdf(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(pdf_response(svc.qc_pdf(&id)?, Disposition::Attachment))
}
