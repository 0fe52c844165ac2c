use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfloor_core::ServiceError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Documents that take part in the completion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    MasterCard,
    ElectricDrawing,
    QcFormPdf,
}

impl DocumentKind {
    /// Human-meaningful label reported in missing-prerequisite lists.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::MasterCard => "Master Card PDF",
            DocumentKind::ElectricDrawing => "Electric Drawing PDF",
            DocumentKind::QcFormPdf => "QC Form PDF",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            DocumentKind::MasterCard,
            DocumentKind::ElectricDrawing,
            DocumentKind::QcFormPdf,
        ]
        .into_iter()
        .find(|k| k.label() == label)
    }

    /// Path segment used in storage keys.
    pub fn key_segment(&self) -> &'static str {
        match self {
            DocumentKind::MasterCard => "mastercard",
            DocumentKind::ElectricDrawing => "drawing",
            DocumentKind::QcFormPdf => "qcform",
        }
    }
}

/// One uploaded binary payload.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn pdf(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content_type: Some(PDF_CONTENT_TYPE.to_string()),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check the upload contract: non-empty, PDF content type when one is
    /// declared, and the `%PDF-` signature.
    pub fn validate_pdf(&self, what: &str) -> Result<(), ServiceError> {
        if self.is_empty() {
            return Err(ServiceError::MissingDocument(format!("no {} file uploaded", what)));
        }
        if let Some(ct) = self.content_type.as_deref() {
            let essence = ct.split(';').next().unwrap_or_default().trim();
            if !essence.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
                return Err(ServiceError::Validation(format!(
                    "{} must be {}, got {}",
                    what, PDF_CONTENT_TYPE, essence
                )));
            }
        }
        if !self.bytes.starts_with(PDF_SIGNATURE) {
            return Err(ServiceError::Validation(format!("{} is not a PDF file", what)));
        }
        Ok(())
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, keeping at most
/// 80 characters. Path separators are dropped with everything before them.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .take(80)
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    }
}

/// Storage key for a machine-level document:
/// `machines/{machineId}/{kind}/{epochMillis}-{fileName}`.
pub fn machine_document_key(machine_id: &str, kind: DocumentKind, millis: i64, file_name: &str) -> String {
    format!(
        "machines/{}/{}/{}-{}",
        machine_id,
        kind.key_segment(),
        millis,
        sanitize_file_name(file_name)
    )
}

/// Storage key for a QC form PDF: `qc/{machineId}/qcform-{qcId}-{epochMillis}.pdf`.
pub fn qc_pdf_key(machine_id: &str, qc_id: &str, millis: i64) -> String {
    format!("qc/{}/qcform-{}-{}.pdf", machine_id, qc_id, millis)
}

/// Last path segment of a reference, used as the download file name.
pub fn reference_file_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Best-effort upload time recovered from the first run of 13 digits in a
/// reference (a millisecond epoch). Prefer the explicit `*UploadedAt` fields.
pub fn reference_timestamp(reference: &str) -> Option<DateTime<Utc>> {
    let bytes = reference.as_bytes();
    let mut run_start = None;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            let start = *run_start.get_or_insert(i);
            if i + 1 - start == 13 {
                let millis: i64 = reference[start..=i].parse().ok()?;
                return DateTime::from_timestamp_millis(millis);
            }
        } else {
            run_start = None;
        }
    }
    None
}
