use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use shopfloor_machine::model::{DocumentKind, Machine, MachineModel, QcForm, Slot, SubmitQcForm, PDF_CONTENT_TYPE};

use crate::error::{ClientError, ErrorKind};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A PDF to upload.
#[derive(Debug, Clone)]
pub struct PdfFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    fn part(&self) -> Result<Part, ClientError> {
        file_part(self.bytes.clone(), self.file_name.clone(), PDF_CONTENT_TYPE)
    }
}

/// Build a file part. A bad content type is an input problem, not a
/// transport failure.
fn file_part(bytes: Vec<u8>, file_name: String, content_type: &str) -> Result<Part, ClientError> {
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(content_type)
        .map_err(|e| {
            ClientError::new(
                ErrorKind::Validation,
                format!("invalid content type {:?}: {}", content_type, e),
            )
        })
}

/// Fields for placing a machine.
#[derive(Debug, Clone)]
pub struct NewMachine {
    pub block_no: u32,
    pub model: MachineModel,
    pub product_no: String,
    pub name: Option<String>,
    pub machine_no: Option<String>,
    pub document: PdfFile,
}

/// Verdict returned by `GET /api/machines/{id}/eligibility`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EligibilityView {
    pub eligible: bool,
    pub missing: Vec<String>,
}

/// Typed HTTP client for the shop-floor API.
#[derive(Debug, Clone)]
pub struct ShopfloorClient {
    http: reqwest::Client,
    base_url: String,
}

impl ShopfloorClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map non-success responses to `ClientError`.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::from_response(status.as_u16(), &body))
    }

    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, ClientError> {
        let resp = Self::check(resp).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ClientError::new(ErrorKind::Decode, format!("response body: {}", e)))
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ClientError> {
        debug!("GET {}", path);
        let resp = self.http.get(self.url(path)).send().await?;
        Self::parse(resp).await
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        debug!("GET {}", path);
        let resp = Self::check(self.http.get(self.url(path)).send().await?).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn post_form<R: DeserializeOwned>(&self, path: &str, form: Form) -> Result<R, ClientError> {
        debug!("POST {} (multipart)", path);
        let resp = self.http.post(self.url(path)).multipart(form).send().await?;
        Self::parse(resp).await
    }

    // ── Service ──

    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.get_json("/health").await
    }

    // ── Machines ──

    pub async fn list_active(&self) -> Result<Vec<Machine>, ClientError> {
        self.get_json("/api/machines").await
    }

    pub async fn list_completed(&self) -> Result<Vec<Machine>, ClientError> {
        self.get_json("/api/machines/completed").await
    }

    pub async fn blocks(&self) -> Result<Vec<Slot>, ClientError> {
        self.get_json("/api/machines/blocks").await
    }

    pub async fn get_machine(&self, id: &str) -> Result<Machine, ClientError> {
        self.get_json(&format!("/api/machines/{}", id)).await
    }

    pub async fn eligibility(&self, id: &str) -> Result<EligibilityView, ClientError> {
        self.get_json(&format!("/api/machines/{}/eligibility", id)).await
    }

    pub async fn place_machine(&self, input: &NewMachine) -> Result<Machine, ClientError> {
        let mut form = Form::new()
            .text("blockNo", input.block_no.to_string())
            .text("model", input.model.as_str())
            .text("productNo", input.product_no.clone());
        if let Some(name) = &input.name {
            form = form.text("name", name.clone());
        }
        if let Some(machine_no) = &input.machine_no {
            form = form.text("machineNo", machine_no.clone());
        }
        let form = form.part("pdf", input.document.part()?);
        self.post_form("/api/machines", form).await
    }

    pub async fn remove(&self, id: &str) -> Result<(), ClientError> {
        debug!("DELETE /api/machines/{}", id);
        let resp = self.http.delete(self.url(&format!("/api/machines/{}", id))).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Upload the master card or electric drawing.
    pub async fn upload_document(
        &self,
        id: &str,
        kind: DocumentKind,
        file: &PdfFile,
    ) -> Result<Machine, ClientError> {
        let field = match kind {
            DocumentKind::MasterCard => "mastercard",
            DocumentKind::ElectricDrawing => "drawing",
            DocumentKind::QcFormPdf => {
                return Err(ClientError::new(
                    ErrorKind::Validation,
                    "QC form PDFs are uploaded with upload_qc_pdf",
                ))
            }
        };
        let form = Form::new().part(field, file.part()?);
        self.post_form(&format!("/api/machines/{}/{}", id, field), form).await
    }

    pub async fn master_card_pdf(&self, id: &str) -> Result<Vec<u8>, ClientError> {
        self.get_bytes(&format!("/api/machines/{}/mastercard", id)).await
    }

    pub async fn drawing_pdf(&self, id: &str) -> Result<Vec<u8>, ClientError> {
        self.get_bytes(&format!("/api/machines/{}/drawingpdf", id)).await
    }

    pub async fn complete(&self, id: &str) -> Result<Machine, ClientError> {
        debug!("POST /api/machines/{}/complete", id);
        let resp = self
            .http
            .post(self.url(&format!("/api/machines/{}/complete", id)))
            .send()
            .await?;
        Self::parse(resp).await
    }

    // ── QC forms ──

    pub async fn list_qc_forms(&self, machine_id: &str) -> Result<Vec<QcForm>, ClientError> {
        debug!("GET /api/qc?machineId={}", machine_id);
        let resp = self
            .http
            .get(self.url("/api/qc"))
            .query(&[("machineId", machine_id)])
            .send()
            .await?;
        Self::parse(resp).await
    }

    pub async fn submit_qc_form(&self, input: &SubmitQcForm) -> Result<QcForm, ClientError> {
        debug!("POST /api/qc for machine {}", input.machine_id);
        let resp = self.http.post(self.url("/api/qc")).json(input).send().await?;
        Self::parse(resp).await
    }

    pub async fn get_qc_form(&self, qc_id: &str) -> Result<QcForm, ClientError> {
        self.get_json(&format!("/api/qc/{}", qc_id)).await
    }

    pub async fn upload_qc_pdf(&self, qc_id: &str, file: &PdfFile) -> Result<QcForm, ClientError> {
        let form = Form::new().part("pdf", file.part()?);
        self.post_form(&format!("/api/qc/{}/pdf", qc_id), form).await
    }

    pub async fn qc_pdf(&self, qc_id: &str) -> Result<Vec<u8>, ClientError> {
        self.get_bytes(&format!("/api/qc/{}/pdf", qc_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ShopfloorClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.url("/api/machines"), "http://localhost:8080/api/machines");
    }

    #[test]
    fn bad_content_type_is_validation() {
        assert!(file_part(b"%PDF-".to_vec(), "a.pdf".into(), PDF_CONTENT_TYPE).is_ok());

        let Err(err) = file_part(b"%PDF-".to_vec(), "a.pdf".into(), "not a mime") else {
            panic!("expected an invalid content type error");
        };
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!err.is_retryable_with_same_input());
    }

    #[tokio::test]
    async fn qc_pdf_kind_is_rejected_locally() {
        let client = ShopfloorClient::new("http://127.0.0.1:9").unwrap();
        let err = client
            .upload_document("m1", DocumentKind::QcFormPdf, &PdfFile::new("a.pdf", b"%PDF-".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let client = ShopfloorClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.list_active().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.is_retryable_with_same_input());
    }
}
