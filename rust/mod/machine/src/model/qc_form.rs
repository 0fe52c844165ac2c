use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shopfloor_core::ServiceError;

/// QC inspection verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcStatus {
    Pass,
    Fail,
}

impl QcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QcStatus::Pass => "PASS",
            QcStatus::Fail => "FAIL",
        }
    }
}

impl FromStr for QcStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PASS" => Ok(QcStatus::Pass),
            "FAIL" => Ok(QcStatus::Fail),
            other => Err(ServiceError::Validation(format!(
                "QC status must be PASS or FAIL, got {:?}",
                other
            ))),
        }
    }
}

/// One inspection record for one machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QcForm {
    pub id: String,

    pub machine_id: String,

    pub inspector_name: String,

    pub status: QcStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    /// Reference to the stored form PDF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_generated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,
}

/// Body of `POST /api/qc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitQcForm {
    pub machine_id: String,
    pub inspector_name: String,
    pub status: String,
    pub remarks: Option<String>,
}

impl QcForm {
    pub fn has_pdf(&self) -> bool {
        self.pdf_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}
