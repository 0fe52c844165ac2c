use tracing::{info, warn};

use shopfloor_core::{new_id, now_millis, now_rfc3339, ServiceError};
use shopfloor_sql::Value;

use crate::model::{qc_pdf_key, Machine, QcForm, QcStatus, Upload};
pub use crate::model::SubmitQcForm;
use crate::pdf::render_qc_form;
use super::documents::DocumentContent;
use super::{storage_err, to_json, upload_err, MachineService};

impl MachineService {
    /// Record an inspection and render its PDF. A PDF that cannot be stored
    /// leaves the form without `pdfPath`; `attach_qc_pdf` can fill it later.
    pub fn submit_qc_form(&self, input: SubmitQcForm) -> Result<QcForm, ServiceError> {
        let machine = self.get_active_machine(&input.machine_id)?;
        let inspector_name = input.inspector_name.trim();
        if inspector_name.is_empty() {
            return Err(ServiceError::Validation("inspector name is required".into()));
        }
        let status: QcStatus = input.status.parse()?;

        let form = QcForm {
            id: new_id(),
            machine_id: machine.id.clone(),
            inspector_name: inspector_name.to_string(),
            status,
            remarks: input.remarks.filter(|r| !r.trim().is_empty()),
            pdf_path: None,
            pdf_generated_at: None,
            create_at: Some(now_rfc3339()),
        };

        // The machine may complete or disappear after the check above; the
        // insert only lands while it is still active.
        let inserted = self
            .sql
            .exec(
                "INSERT INTO qc_forms (id, data, machine_id, status, pdf_path, create_at)
                 SELECT ?1, ?2, ?3, ?4, NULL, ?5
                 WHERE EXISTS (SELECT 1 FROM machines WHERE id = ?3 AND completed = 0)",
                &[
                    Value::Text(form.id.clone()),
                    Value::Text(to_json(&form)?),
                    Value::Text(form.machine_id.clone()),
                    Value::from(form.status.as_str()),
                    Value::Text(form.create_at.clone().unwrap_or_default()),
                ],
            )
            .map_err(storage_err)?;
        if inserted == 0 {
            return Err(ServiceError::NotFound(format!(
                "machine {} is no longer active",
                machine.id
            )));
        }
        info!(
            "QC form {} submitted for machine {} ({})",
            form.id,
            machine.id,
            form.status.as_str()
        );

        match self.generate_pdf(&form, &machine) {
            Ok(form) => Ok(form),
            Err(e) => {
                warn!("QC form {}: PDF generation failed: {}", form.id, e);
                Ok(form)
            }
        }
    }

    fn generate_pdf(&self, form: &QcForm, machine: &Machine) -> Result<QcForm, ServiceError> {
        let bytes = render_qc_form(form, machine);
        let millis = now_millis();
        let key = qc_pdf_key(&machine.id, &form.id, millis);
        self.blob.put(&key, &bytes).map_err(upload_err)?;
        self.set_qc_pdf(form.clone(), key.clone(), millis)
            .inspect_err(|_| self.discard_blob(&key))
    }

    /// Replace a form's PDF with an uploaded one.
    pub fn attach_qc_pdf(&self, qc_id: &str, upload: Upload) -> Result<QcForm, ServiceError> {
        let form = self.get_qc_form(qc_id)?;
        self.get_active_machine(&form.machine_id)?;
        upload.validate_pdf("QC form PDF")?;

        let previous = form.pdf_path.clone().filter(|p| !p.is_empty());
        if let Some(prev) = previous.as_deref() {
            if matches!(self.blob.get(prev), Ok(Some(bytes)) if bytes == upload.bytes) {
                return Ok(form);
            }
        }

        let millis = now_millis();
        let key = qc_pdf_key(&form.machine_id, &form.id, millis);
        self.blob.put(&key, &upload.bytes).map_err(upload_err)?;
        let form = match self.set_qc_pdf(form, key.clone(), millis) {
            Ok(form) => form,
            Err(e) => {
                self.discard_blob(&key);
                return Err(e);
            }
        };

        if let Some(prev) = previous.filter(|p| *p != key) {
            self.discard_blob(&prev);
        }
        info!("QC form {}: PDF uploaded", form.id);
        Ok(form)
    }

    fn set_qc_pdf(&self, mut form: QcForm, key: String, millis: i64) -> Result<QcForm, ServiceError> {
        form.pdf_path = Some(key);
        form.pdf_generated_at = Some(
            chrono::DateTime::from_timestamp_millis(millis)
                .unwrap_or_else(chrono::Utc::now)
                .to_rfc3339(),
        );
        let affected = self
            .sql
            .exec(
                "UPDATE qc_forms SET data = ?1, pdf_path = ?2 WHERE id = ?3",
                &[
                    Value::Text(to_json(&form)?),
                    Value::from(form.pdf_path.clone().unwrap_or_default()),
                    Value::Text(form.id.clone()),
                ],
            )
            .map_err(storage_err)?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("QC form {} not found", form.id)));
        }
        Ok(form)
    }

    pub fn get_qc_form(&self, qc_id: &str) -> Result<QcForm, ServiceError> {
        self.get_record("qc_forms", qc_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("QC form {} not found", qc_id)))
    }

    /// QC forms of one machine, oldest first.
    pub fn list_qc_forms(&self, machine_id: &str) -> Result<Vec<QcForm>, ServiceError> {
        self.query_records(
            "SELECT data FROM qc_forms WHERE machine_id = ?1 ORDER BY create_at ASC, id ASC",
            &[Value::from(machine_id)],
        )
    }

    pub fn qc_pdf(&self, qc_id: &str) -> Result<DocumentContent, ServiceError> {
        let form = self.get_qc_form(qc_id)?;
        self.read_document(form.pdf_path.as_deref(), "QC form PDF")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::service::testing::*;
    use crate::service::registry::PlaceMachineInput;
    use crate::service::RegistryConfig;

    fn place(svc: &MachineService) -> Machine {
        svc.place_machine(PlaceMachineInput {
            block_no: 3,
            model: "CPT425-SERRA".into(),
            product_no: "1234567".into(),
            document: Some(pdf("order.pdf")),
            ..Default::default()
        })
        .unwrap()
    }

    fn inspection(machine_id: &str, status: &str) -> SubmitQcForm {
        SubmitQcForm {
            machine_id: machine_id.into(),
            inspector_name: "Ana".into(),
            status: status.into(),
            remarks: Some("all bolts torqued".into()),
        }
    }

    #[test]
    fn submit_renders_and_stores_pdf() {
        let (svc, _dir) = test_service();
        let m = place(&svc);

        let form = svc.submit_qc_form(inspection(&m.id, "PASS")).unwrap();
        assert_eq!(form.status, QcStatus::Pass);
        let path = form.pdf_path.clone().unwrap();
        assert!(path.starts_with(&format!("qc/{}/qcform-{}-", m.id, form.id)));
        assert!(form.pdf_generated_at.is_some());

        let content = svc.qc_pdf(&form.id).unwrap();
        assert!(content.bytes.starts_with(b"%PDF-"));
        assert_eq!(svc.get_qc_form(&form.id).unwrap(), form);
        assert_eq!(svc.list_qc_forms(&m.id).unwrap(), vec![form]);
    }

    #[test]
    fn submit_rejects_bad_input() {
        let (svc, _dir) = test_service();
        let m = place(&svc);

        let mut blank = inspection(&m.id, "PASS");
        blank.inspector_name = "   ".into();
        assert!(matches!(svc.submit_qc_form(blank), Err(ServiceError::Validation(_))));
        assert!(matches!(
            svc.submit_qc_form(inspection(&m.id, "MAYBE")),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.submit_qc_form(inspection("nope", "PASS")),
            Err(ServiceError::NotFound(_))
        ));
        assert!(svc.list_qc_forms(&m.id).unwrap().is_empty());
    }

    #[test]
    fn storage_failure_keeps_form_without_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(FlakyBlobs::new(dir.path()));
        let svc = service_with(blobs.clone(), RegistryConfig::default());
        let m = place(&svc);

        blobs.set_failing(true);
        let form = svc.submit_qc_form(inspection(&m.id, "PASS")).unwrap();
        assert!(form.pdf_path.is_none());
        assert!(!svc.get_qc_form(&form.id).unwrap().has_pdf());
        assert!(matches!(svc.qc_pdf(&form.id), Err(ServiceError::NotFound(_))));

        blobs.set_failing(false);
        let recovered = svc
            .attach_qc_pdf(&form.id, pdf("signed-form.pdf"))
            .unwrap();
        assert!(recovered.has_pdf());
        assert_eq!(svc.qc_pdf(&form.id).unwrap().bytes, PDF);
    }

    #[test]
    fn attach_qc_pdf_replaces_previous() {
        let (svc, _dir) = test_service();
        let m = place(&svc);
        let form = svc.submit_qc_form(inspection(&m.id, "FAIL")).unwrap();
        let generated = form.pdf_path.clone().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));

        let replaced = svc.attach_qc_pdf(&form.id, pdf("scan.pdf")).unwrap();
        assert_ne!(replaced.pdf_path.as_deref(), Some(generated.as_str()));
        assert!(svc.blob.get(&generated).unwrap().is_none());

        let again = svc.attach_qc_pdf(&form.id, pdf("scan.pdf")).unwrap();
        assert_eq!(again, replaced);
    }

    #[test]
    fn attach_qc_pdf_validates_upload() {
        let (svc, _dir) = test_service();
        let m = place(&svc);
        let form = svc.submit_qc_form(inspection(&m.id, "PASS")).unwrap();

        let empty = Upload::pdf("x.pdf", Vec::new());
        assert!(matches!(
            svc.attach_qc_pdf(&form.id, empty),
            Err(ServiceError::MissingDocument(_))
        ));
        let text = Upload::pdf("x.pdf", b"hello".to_vec());
        assert!(matches!(
            svc.attach_qc_pdf(&form.id, text),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.attach_qc_pdf("missing", pdf("x.pdf")),
            Err(ServiceError::NotFound(_))
        ));
    }
}
