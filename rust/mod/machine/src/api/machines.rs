use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use shopfloor_core::ServiceError;

use crate::model::{DocumentKind, Machine, Slot};
use crate::service::registry::PlaceMachineInput;
use super::{
    created, ok_json, pdf_response, read_upload, ApiMultipart, AppState, Disposition, MultipartForm,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/machines", get(list_active).post(create_machine))
        .route("/api/machines/completed", get(list_completed))
        .route("/api/machines/blocks", get(list_blocks))
        .route("/api/machines/{id}", get(get_machine).delete(delete_machine))
        .route("/api/machines/{id}/eligibility", get(get_eligibility))
        .route("/api/machines/{id}/complete", post(complete_machine))
        .route(
            "/api/machines/{id}/mastercard",
            post(upload_master_card).get(view_master_card),
        )
        .route("/api/machines/{id}/drawing", post(upload_drawing).get(download_drawing))
        .route("/api/machines/{id}/drawingpdf", get(view_drawing))
}

/// Response of the eligibility endpoint.
#[derive(Debug, Serialize)]
struct EligibilityBody {
    eligible: bool,
    missing: Vec<String>,
}

async fn list_active(State(svc): State<AppState>) -> Result<Json<Vec<Machine>>, ServiceError> {
    ok_json(svc.list_active())
}

async fn list_completed(State(svc): State<AppState>) -> Result<Json<Vec<Machine>>, ServiceError> {
    ok_json(svc.list_completed())
}

async fn list_blocks(State(svc): State<AppState>) -> Result<Json<Vec<Slot>>, ServiceError> {
    ok_json(svc.block_slots())
}

async fn get_machine(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Machine>, ServiceError> {
    ok_json(svc.get_machine(&id))
}

async fn get_eligibility(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EligibilityBody>, ServiceError> {
    let verdict = svc.eligibility(&id)?;
    Ok(Json(EligibilityBody {
        eligible: verdict.eligible,
        missing: verdict.missing_labels(),
    }))
}

/// `POST /api/machines`: multipart with the order PDF in `pdf`.
/// `status`, `completed`, `masterCardInfo` and `electricDrawingPath` are
/// accepted and ignored.
async fn create_machine(
    State(svc): State<AppState>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<(StatusCode, Json<Machine>), ServiceError> {
    let mut form = MultipartForm::read(multipart, &["pdf"]).await?;

    let block_no = match form.text("blockNo") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ServiceError::Validation(format!("invalid block number {:?}", raw)))?,
        None => return Err(ServiceError::Validation("blockNo is required".into())),
    };
    let input = PlaceMachineInput {
        block_no,
        model: form.text("model").unwrap_or_default().to_string(),
        product_no: form.text("productNo").unwrap_or_default().to_string(),
        name: form.text("name").map(String::from),
        machine_no: form.text("machineNo").map(String::from),
        document: form.take_file("pdf"),
    };
    created(svc.place_machine(input))
}

async fn delete_machine(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.remove(&id)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn complete_machine(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Machine>, ServiceError> {
    ok_json(svc.complete(&id))
}

async fn upload_master_card(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Json<Machine>, ServiceError> {
    let upload = read_upload(multipart, "mastercard").await?;
    ok_json(svc.attach_document(&id, DocumentKind::MasterCard, upload))
}

async fn upload_drawing(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Json<Machine>, ServiceError> {
    let upload = read_upload(multipart, "drawing").await?;
    ok_json(svc.attach_document(&id, DocumentKind::ElectricDrawing, upload))
}

async fn view_master_card(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let content = svc.machine_document(&id, DocumentKind::MasterCard)?;
    Ok(pdf_response(content, Disposition::Inline))
}

async fn view_drawing(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let content = svc.machine_document(&id, DocumentKind::ElectricDrawing)?;
    Ok(pdf_response(content, Disposition::Inline))
}

async fn download_drawing(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let content = svc.machine_document(&id, DocumentKind::ElectricDrawing)?;
    Ok(pdf_response(content, Disposition::Attachment))
}
