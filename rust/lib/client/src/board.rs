//! Client-side view of the shop floor.
//!
//! `MachineBoard` owns the only client copy of the active machine list and
//! publishes it over a watch channel. Mutations go to the server once; a
//! successful mutation is followed by a re-fetch, a failed one leaves the
//! published snapshot untouched.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use shopfloor_machine::eligibility::{is_eligible, Eligibility, EligibilityPolicy};
use shopfloor_machine::model::{block_slots, DocumentKind, Machine, QcForm, Slot, SubmitQcForm};

use crate::client::{NewMachine, PdfFile, ShopfloorClient};
use crate::error::ClientError;

/// Active machines as last fetched from the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    /// Ordered by block number.
    pub active: Vec<Machine>,
    /// `None` until the first successful fetch.
    pub fetched_at: Option<DateTime<Utc>>,
}

pub struct MachineBoard {
    client: ShopfloorClient,
    block_count: u32,
    policy: EligibilityPolicy,
    tx: watch::Sender<BoardSnapshot>,
}

impl MachineBoard {
    /// `block_count` and `policy` must match the server's registry settings.
    pub fn new(client: ShopfloorClient, block_count: u32, policy: EligibilityPolicy) -> Self {
        let (tx, _rx) = watch::channel(BoardSnapshot::default());
        Self {
            client,
            block_count,
            policy,
            tx,
        }
    }

    pub fn client(&self) -> &ShopfloorClient {
        &self.client
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.tx.borrow().clone()
    }

    /// Blocks `1..=N` over the current snapshot, empty ones as placeholders.
    pub fn slots(&self) -> Vec<Slot> {
        block_slots(&self.tx.borrow().active, self.block_count)
    }

    /// Fetch the active list and publish it.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let active = self.client.list_active().await?;
        self.tx.send_replace(BoardSnapshot {
            active,
            fetched_at: Some(Utc::now()),
        });
        Ok(())
    }

    /// Re-fetch after a committed mutation. The mutation already succeeded,
    /// so a failed re-fetch is only logged.
    async fn refresh_after(&self, action: &str) {
        if let Err(e) = self.refresh().await {
            warn!("board refresh after {} failed: {}", action, e);
        }
    }

    pub async fn place(&self, input: &NewMachine) -> Result<Machine, ClientError> {
        let machine = self.client.place_machine(input).await?;
        info!("placed {} in block {}", machine.product_no, machine.block_no);
        self.refresh_after("place").await;
        Ok(machine)
    }

    pub async fn attach_document(
        &self,
        machine_id: &str,
        kind: DocumentKind,
        file: &PdfFile,
    ) -> Result<Machine, ClientError> {
        let machine = self.client.upload_document(machine_id, kind, file).await?;
        self.refresh_after("document upload").await;
        Ok(machine)
    }

    pub async fn submit_qc(&self, input: &SubmitQcForm) -> Result<QcForm, ClientError> {
        let form = self.client.submit_qc_form(input).await?;
        self.refresh_after("QC submission").await;
        Ok(form)
    }

    pub async fn remove(&self, machine_id: &str) -> Result<(), ClientError> {
        self.client.remove(machine_id).await?;
        self.refresh_after("remove").await;
        Ok(())
    }

    /// Evaluate completion against freshly fetched server state.
    pub async fn completion_check(&self, machine_id: &str) -> Result<Eligibility, ClientError> {
        let machine = self.client.get_machine(machine_id).await?;
        let forms = self.client.list_qc_forms(machine_id).await?;
        Ok(is_eligible(&machine, &forms, self.policy))
    }

    /// Complete a machine. Refused locally when the fresh check fails; the
    /// server still has the final word otherwise.
    pub async fn complete(&self, machine_id: &str) -> Result<Machine, ClientError> {
        let verdict = self.completion_check(machine_id).await?;
        if !verdict.eligible {
            return Err(ClientError::not_eligible(verdict.missing_labels()));
        }
        let machine = self.client.complete(machine_id).await?;
        info!("completed {} from block {}", machine.product_no, machine.block_no);
        self.refresh_after("complete").await;
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_has_placeholder_slots() {
        let client = ShopfloorClient::new("http://127.0.0.1:9").unwrap();
        let board = MachineBoard::new(client, 4, EligibilityPolicy::default());

        assert_eq!(board.snapshot(), BoardSnapshot::default());
        let slots = board.slots();
        assert_eq!(slots.len(), 4);
        assert!(slots.iter().all(|s| s.is_empty()));
        assert_eq!(slots.iter().map(|s| s.block_no).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_snapshot() {
        let client = ShopfloorClient::new("http://127.0.0.1:9").unwrap();
        let board = MachineBoard::new(client, 12, EligibilityPolicy::default());
        let rx = board.subscribe();

        assert!(board.refresh().await.is_err());
        assert!(!rx.has_changed().unwrap());
        assert!(board.snapshot().fetched_at.is_none());
    }
}
