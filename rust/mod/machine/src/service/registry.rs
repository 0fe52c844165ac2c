use tracing::{info, warn};

use shopfloor_core::{new_id, now_rfc3339, ServiceError};
use shopfloor_sql::Value;

use crate::eligibility::{is_eligible, Eligibility, EligibilityPolicy};
use crate::model::{
    block_slots, DocumentKind, Machine, MachineModel, MachineStatus, ProductNo, Slot, Upload,
};
use super::{storage_err, to_json, MachineService};

/// Parameters for placing a machine into an empty block.
#[derive(Debug, Clone, Default)]
pub struct PlaceMachineInput {
    pub block_no: u32,
    pub model: String,
    pub product_no: String,
    pub name: Option<String>,
    pub machine_no: Option<String>,
    /// Initial order document, stored as the master card.
    pub document: Option<Upload>,
}

impl MachineService {
    // ── Queries ──

    /// Any machine, active or completed.
    pub fn get_machine(&self, id: &str) -> Result<Machine, ServiceError> {
        self.get_record("machines", id)?
            .ok_or_else(|| ServiceError::NotFound(format!("machine {} not found", id)))
    }

    /// A machine that still occupies a block.
    pub fn get_active_machine(&self, id: &str) -> Result<Machine, ServiceError> {
        let machine = self.get_machine(id)?;
        if machine.completed {
            return Err(ServiceError::NotFound(format!(
                "machine {} is already completed",
                id
            )));
        }
        Ok(machine)
    }

    /// Active machines ordered by block.
    pub fn list_active(&self) -> Result<Vec<Machine>, ServiceError> {
        self.query_records(
            "SELECT data FROM machines WHERE completed = 0 ORDER BY block_no ASC",
            &[],
        )
    }

    /// Completed machines, most recently completed first.
    pub fn list_completed(&self) -> Result<Vec<Machine>, ServiceError> {
        self.query_records(
            "SELECT data FROM machines WHERE completed = 1 ORDER BY completed_at DESC, id ASC",
            &[],
        )
    }

    /// All `N` blocks with empty ones as placeholders.
    pub fn block_slots(&self) -> Result<Vec<Slot>, ServiceError> {
        let active = self.list_active()?;
        Ok(block_slots(&active, self.config.block_count))
    }

    /// Evaluate the completion rule against current storage.
    pub fn eligibility(&self, id: &str) -> Result<Eligibility, ServiceError> {
        let machine = self.get_machine(id)?;
        let forms = self.list_qc_forms(id)?;
        Ok(is_eligible(&machine, &forms, self.config.policy))
    }

    // ── Placement ──

    pub fn place_machine(&self, input: PlaceMachineInput) -> Result<Machine, ServiceError> {
        let block_count = self.config.block_count;
        if input.block_no < 1 || input.block_no > block_count {
            return Err(ServiceError::Validation(format!(
                "block number must be between 1 and {}",
                block_count
            )));
        }
        let model: MachineModel = input.model.parse()?;
        let product_no = ProductNo::parse(&input.product_no)?;

        let upload = input
            .document
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ServiceError::MissingDocument("an initial order PDF is required".into())
            })?;
        upload.validate_pdf("order document")?;

        let occupied = self.count(
            "SELECT COUNT(*) AS cnt FROM machines WHERE block_no = ?1 AND completed = 0",
            &[Value::Integer(input.block_no as i64)],
        )?;
        if occupied > 0 {
            return Err(slot_occupied(input.block_no));
        }
        let taken = self.count(
            "SELECT COUNT(*) AS cnt FROM machines WHERE product_no = ?1",
            &[Value::from(product_no.as_str())],
        )?;
        if taken > 0 {
            return Err(duplicate_product_no(&product_no));
        }

        let id = new_id();
        let stored = self.store_document(&id, DocumentKind::MasterCard, &upload)?;
        let now = now_rfc3339();

        let machine = Machine {
            id: id.clone(),
            block_no: input.block_no,
            model,
            product_no,
            name: input.name.filter(|s| !s.trim().is_empty()),
            machine_no: input.machine_no.filter(|s| !s.trim().is_empty()),
            master_card_info: Some(stored.key.clone()),
            master_card_uploaded_at: Some(stored.uploaded_at),
            electric_drawing_path: None,
            electric_drawing_uploaded_at: None,
            completed: false,
            status: MachineStatus::Incomplete,
            completed_at: None,
            create_at: Some(now.clone()),
            update_at: Some(now.clone()),
        };

        let insert = self.sql.exec(
            "INSERT INTO machines (id, data, block_no, product_no, completed, create_at, update_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
            &[
                Value::Text(id.clone()),
                Value::Text(to_json(&machine)?),
                Value::Integer(machine.block_no as i64),
                Value::from(machine.product_no.as_str()),
                Value::Text(now.clone()),
                Value::Text(now),
            ],
        );
        if let Err(e) = insert {
            self.discard_blob(&stored.key);
            return Err(match e {
                e if e.violates("block_no") => slot_occupied(machine.block_no),
                e if e.violates("product_no") => duplicate_product_no(&machine.product_no),
                e => storage_err(e),
            });
        }

        info!(
            "placed machine {} ({} / {}) in block {}",
            machine.id, machine.model, machine.product_no, machine.block_no
        );
        Ok(machine)
    }

    // ── Documents ──

    /// Replace the master card or electric drawing of an active machine.
    /// Re-sending the document already stored is a no-op.
    pub fn attach_document(
        &self,
        id: &str,
        kind: DocumentKind,
        upload: Upload,
    ) -> Result<Machine, ServiceError> {
        if kind == DocumentKind::QcFormPdf {
            return Err(ServiceError::Validation(
                "QC form PDFs are attached to QC forms, not machines".into(),
            ));
        }
        let mut machine = self.get_active_machine(id)?;
        upload.validate_pdf(kind.label())?;

        let previous = machine.document(kind).map(String::from);
        if let Some(prev) = previous.as_deref() {
            if self.is_same_document(prev, &upload) {
                return Ok(machine);
            }
        }

        let stored = self.store_document(id, kind, &upload)?;
        machine.set_document(kind, stored.key.clone(), stored.uploaded_at);
        machine.update_at = Some(now_rfc3339());

        let updated = self.sql.exec(
            "UPDATE machines SET data = ?1, update_at = ?2 WHERE id = ?3 AND completed = 0",
            &[
                Value::Text(to_json(&machine)?),
                Value::Text(machine.update_at.clone().unwrap_or_default()),
                Value::from(id),
            ],
        );
        match updated {
            Ok(0) => {
                self.discard_blob(&stored.key);
                return Err(ServiceError::NotFound(format!(
                    "machine {} is no longer active",
                    id
                )));
            }
            Ok(_) => {}
            Err(e) => {
                self.discard_blob(&stored.key);
                return Err(storage_err(e));
            }
        }

        if let Some(prev) = previous.filter(|p| *p != stored.key) {
            self.discard_blob(&prev);
        }
        info!("machine {}: {} uploaded", id, kind.label());
        Ok(machine)
    }

    // ── Lifecycle ──

    /// Mark a machine completed once the eligibility rule holds. The block
    /// becomes free for a new placement.
    pub fn complete(&self, id: &str) -> Result<Machine, ServiceError> {
        let mut machine = self.get_active_machine(id)?;
        let forms = self.list_qc_forms(id)?;

        let verdict = is_eligible(&machine, &forms, self.config.policy);
        if !verdict.eligible {
            return Err(not_eligible(&machine, verdict.missing_labels()));
        }

        let now = now_rfc3339();
        machine.completed = true;
        machine.status = MachineStatus::Complete;
        machine.completed_at = Some(now.clone());
        machine.update_at = Some(now.clone());

        // The QC part of the rule is re-checked inside the update, so a form
        // submitted after the read above cannot slip past it.
        let sql = format!(
            "UPDATE machines SET data = ?1, completed = 1, completed_at = ?2, update_at = ?2
             WHERE id = ?3 AND completed = 0 AND {}",
            completion_guard(self.config.policy)
        );
        let affected = self
            .sql
            .exec(&sql, &[Value::Text(to_json(&machine)?), Value::Text(now), Value::from(id)])
            .map_err(storage_err)?;
        if affected == 0 {
            return Err(self.completion_refused(id));
        }

        info!(
            "machine {} ({}) completed, block {} released",
            machine.id, machine.product_no, machine.block_no
        );
        Ok(machine)
    }

    /// Explain why the guarded completion update matched no row.
    fn completion_refused(&self, id: &str) -> ServiceError {
        let machine = match self.get_active_machine(id) {
            Ok(machine) => machine,
            Err(e) => return e,
        };
        match self.eligibility(id) {
            Ok(verdict) if !verdict.eligible => not_eligible(&machine, verdict.missing_labels()),
            // A form without a PDF existed at update time and has one now.
            Ok(_) => not_eligible(&machine, vec![DocumentKind::QcFormPdf.label().to_string()]),
            Err(e) => e,
        }
    }

    /// Permanently delete an active machine with its QC forms and documents.
    pub fn remove(&self, id: &str) -> Result<(), ServiceError> {
        self.get_active_machine(id)?;

        let affected = self
            .sql
            .exec_batch(&[
                (
                    "DELETE FROM qc_forms WHERE machine_id = ?1
                     AND EXISTS (SELECT 1 FROM machines WHERE id = ?1 AND completed = 0)",
                    vec![Value::from(id)],
                ),
                (
                    "DELETE FROM machines WHERE id = ?1 AND completed = 0",
                    vec![Value::from(id)],
                ),
            ])
            .map_err(storage_err)?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "machine {} is no longer active",
                id
            )));
        }

        for prefix in [format!("machines/{}/", id), format!("qc/{}/", id)] {
            match self.blob.list(&prefix) {
                Ok(blobs) => blobs.iter().for_each(|b| self.discard_blob(&b.key)),
                Err(e) => warn!("failed to list blobs under {}: {}", prefix, e),
            }
        }

        info!("machine {} removed", id);
        Ok(())
    }
}

/// SQL condition over `qc_forms` matching the QC part of `policy`.
/// Machine documents are only ever replaced, never cleared, so the
/// evaluator's earlier read of them stays valid.
fn completion_guard(policy: EligibilityPolicy) -> &'static str {
    match policy {
        EligibilityPolicy::QcPdfOnly => {
            "EXISTS (SELECT 1 FROM qc_forms WHERE machine_id = ?3)
             AND NOT EXISTS (SELECT 1 FROM qc_forms WHERE machine_id = ?3
                             AND (pdf_path IS NULL OR pdf_path = ''))"
        }
        EligibilityPolicy::FullDocumentation => {
            "EXISTS (SELECT 1 FROM qc_forms WHERE machine_id = ?3 AND status = 'PASS'
                     AND pdf_path IS NOT NULL AND pdf_path <> '')"
        }
    }
}

fn not_eligible(machine: &Machine, missing: Vec<String>) -> ServiceError {
    ServiceError::not_eligible(&format!("machine {}", machine.product_no), missing)
}

fn slot_occupied(block_no: u32) -> ServiceError {
    ServiceError::SlotOccupied(format!("block {} is already occupied", block_no))
}

fn duplicate_product_no(product_no: &ProductNo) -> ServiceError {
    ServiceError::DuplicateProductNo(format!("product number {} is already in use", product_no))
}
