//! Completion eligibility: a pure predicate over a machine and its QC forms.
//!
//! Called by the registry before committing a completion and by clients to
//! gate the "mark complete" action. Never touches storage.

use serde::{Deserialize, Serialize};

use crate::model::{DocumentKind, Machine, QcForm, QcStatus};

/// Which completion rule is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EligibilityPolicy {
    /// At least one QC form exists and every QC form has a PDF.
    #[default]
    QcPdfOnly,

    /// Master card and electric drawing present, plus at least one
    /// passing QC form with a PDF. Only used when configured explicitly.
    FullDocumentation,
}

/// Verdict of the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    /// Unmet prerequisites in check order, without duplicates.
    pub missing: Vec<DocumentKind>,
}

impl Eligibility {
    pub fn missing_labels(&self) -> Vec<String> {
        self.missing.iter().map(|k| k.label().to_string()).collect()
    }
}

/// Decide whether `machine` may be completed. Forms belonging to other
/// machines are ignored.
pub fn is_eligible(machine: &Machine, qc_forms: &[QcForm], policy: EligibilityPolicy) -> Eligibility {
    let forms: Vec<&QcForm> = qc_forms
        .iter()
        .filter(|f| f.machine_id == machine.id)
        .collect();

    let mut missing = Vec::new();
    match policy {
        EligibilityPolicy::QcPdfOnly => {
            if forms.is_empty() || !forms.iter().all(|f| f.has_pdf()) {
                missing.push(DocumentKind::QcFormPdf);
            }
        }
        EligibilityPolicy::FullDocumentation => {
            if machine.document(DocumentKind::MasterCard).is_none() {
                missing.push(DocumentKind::MasterCard);
            }
            if machine.document(DocumentKind::ElectricDrawing).is_none() {
                missing.push(DocumentKind::ElectricDrawing);
            }
            if !forms.iter().any(|f| f.status == QcStatus::Pass && f.has_pdf()) {
                missing.push(DocumentKind::QcFormPdf);
            }
        }
    }

    Eligibility {
        eligible: missing.is_empty(),
        missing,
    }
}
