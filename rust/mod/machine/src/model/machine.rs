use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shopfloor_core::ServiceError;

use super::DocumentKind;

/// Product models built on the shop floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineModel {
    #[serde(rename = "CPT425-SERRA")]
    Cpt425Serra,
    #[serde(rename = "CPT525-SERRA")]
    Cpt525Serra,
    #[serde(rename = "CPT625-SERRA")]
    Cpt625Serra,
    #[serde(rename = "CPT650-SERRA")]
    Cpt650Serra,
    #[serde(rename = "CPT825-SERRA")]
    Cpt825Serra,
}

impl MachineModel {
    pub const ALL: [MachineModel; 5] = [
        MachineModel::Cpt425Serra,
        MachineModel::Cpt525Serra,
        MachineModel::Cpt625Serra,
        MachineModel::Cpt650Serra,
        MachineModel::Cpt825Serra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineModel::Cpt425Serra => "CPT425-SERRA",
            MachineModel::Cpt525Serra => "CPT525-SERRA",
            MachineModel::Cpt625Serra => "CPT625-SERRA",
            MachineModel::Cpt650Serra => "CPT650-SERRA",
            MachineModel::Cpt825Serra => "CPT825-SERRA",
        }
    }
}

impl fmt::Display for MachineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineModel {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MachineModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ServiceError::Validation(format!("unknown machine model {:?}", s)))
    }
}

/// Seven-digit product number. Unique across the whole registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductNo(String);

impl ProductNo {
    pub const LEN: usize = 7;

    /// Validate and wrap a product number. Surrounding whitespace is trimmed.
    pub fn parse(s: &str) -> Result<Self, ServiceError> {
        let s = s.trim();
        if s.len() != Self::LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ServiceError::Validation(format!(
                "product number must be exactly {} digits, got {:?}",
                Self::LEN,
                s
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse workflow marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    #[default]
    Incomplete,
    Complete,
}

/// A unit occupying one block while it is assembled and inspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    /// Server-assigned identifier.
    pub id: String,

    /// Block (slot) address, `1..=N`.
    pub block_no: u32,

    pub model: MachineModel,

    pub product_no: ProductNo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_no: Option<String>,

    /// Reference to the stored master card PDF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_card_info: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_card_uploaded_at: Option<String>,

    /// Reference to the stored electric drawing PDF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electric_drawing_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electric_drawing_uploaded_at: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub status: MachineStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_at: Option<String>,
}

impl Machine {
    /// Stored reference for a machine-level document. QC PDFs live on the
    /// QC forms, so `QcFormPdf` is always `None` here.
    pub fn document(&self, kind: DocumentKind) -> Option<&str> {
        match kind {
            DocumentKind::MasterCard => self.master_card_info.as_deref(),
            DocumentKind::ElectricDrawing => self.electric_drawing_path.as_deref(),
            DocumentKind::QcFormPdf => None,
        }
        .filter(|r| !r.is_empty())
    }

    /// Explicit upload timestamp for a machine-level document.
    pub fn document_uploaded_at(&self, kind: DocumentKind) -> Option<&str> {
        match kind {
            DocumentKind::MasterCard => self.master_card_uploaded_at.as_deref(),
            DocumentKind::ElectricDrawing => self.electric_drawing_uploaded_at.as_deref(),
            DocumentKind::QcFormPdf => None,
        }
    }

    /// Point `kind` at a new reference. Last write wins.
    pub fn set_document(&mut self, kind: DocumentKind, reference: String, uploaded_at: String) {
        match kind {
            DocumentKind::MasterCard => {
                self.master_card_info = Some(reference);
                self.master_card_uploaded_at = Some(uploaded_at);
            }
            DocumentKind::ElectricDrawing => {
                self.electric_drawing_path = Some(reference);
                self.electric_drawing_uploaded_at = Some(uploaded_at);
            }
            DocumentKind::QcFormPdf => {}
        }
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }
}
