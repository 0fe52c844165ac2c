use tracing::debug;

use shopfloor_core::{now_millis, ServiceError};

use crate::model::{machine_document_key, reference_file_name, DocumentKind, Upload};
use super::{upload_err, MachineService};

/// A document written to the blob store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub key: String,
    pub uploaded_at: String,
}

/// Bytes of a stored document, ready to be served.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MachineService {
    /// Write a validated upload under a fresh time-stamped key.
    pub(crate) fn store_document(
        &self,
        machine_id: &str,
        kind: DocumentKind,
        upload: &Upload,
    ) -> Result<StoredDocument, ServiceError> {
        let millis = now_millis();
        let file_name = upload.file_name.as_deref().unwrap_or("document.pdf");
        let key = machine_document_key(machine_id, kind, millis, file_name);

        self.blob.put(&key, &upload.bytes).map_err(upload_err)?;
        debug!("stored {} ({} bytes) at {}", kind.label(), upload.bytes.len(), key);

        let uploaded_at = chrono::DateTime::from_timestamp_millis(millis)
            .unwrap_or_else(chrono::Utc::now)
            .to_rfc3339();
        Ok(StoredDocument { key, uploaded_at })
    }

    /// True when `reference` already holds exactly this upload (same
    /// sanitized file name and same bytes).
    pub(crate) fn is_same_document(&self, reference: &str, upload: &Upload) -> bool {
        let wanted = crate::model::sanitize_file_name(
            upload.file_name.as_deref().unwrap_or("document.pdf"),
        );
        let stored_name = reference_file_name(reference);
        let name_matches = stored_name
            .split_once('-')
            .is_some_and(|(_, name)| name == wanted);
        if !name_matches {
            return false;
        }
        matches!(self.blob.get(reference), Ok(Some(bytes)) if bytes == upload.bytes)
    }

    /// Read a referenced blob. A missing reference or blob is `NotFound`.
    pub(crate) fn read_document(
        &self,
        reference: Option<&str>,
        what: &str,
    ) -> Result<DocumentContent, ServiceError> {
        let reference = reference
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ServiceError::NotFound(format!("no {} uploaded", what)))?;
        let bytes = self
            .blob
            .get(reference)
            .map_err(|e| ServiceError::Storage(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound(format!("{} file is missing from storage", what)))?;
        Ok(DocumentContent {
            file_name: reference_file_name(reference).to_string(),
            bytes,
        })
    }

    /// Fetch a machine-level document (active or completed machine).
    pub fn machine_document(
        &self,
        machine_id: &str,
        kind: DocumentKind,
    ) -> Result<DocumentContent, ServiceError> {
        let machine = self.get_machine(machine_id)?;
        self.read_document(machine.document(kind), kind.label())
    }
}
