use serde::{Deserialize, Serialize};

use super::Machine;

/// One block on the shop floor, either holding an active machine or empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub block_no: u32,
    pub machine: Option<Machine>,
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        self.machine.is_none()
    }
}

/// Lay out active machines over blocks `1..=block_count`, synthesizing
/// empty placeholders. Machines outside the range or completed are skipped;
/// if two machines claim one block the first wins.
pub fn block_slots(active: &[Machine], block_count: u32) -> Vec<Slot> {
    let mut slots: Vec<Slot> = (1..=block_count)
        .map(|block_no| Slot { block_no, machine: None })
        .collect();

    for m in active.iter().filter(|m| m.is_active()) {
        if m.block_no == 0 || m.block_no > block_count {
            continue;
        }
        let slot = &mut slots[(m.block_no - 1) as usize];
        if slot.machine.is_none() {
            slot.machine = Some(m.clone());
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(id: &str, block_no: u32, completed: bool) -> Machine {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "blockNo": block_no,
            "model": "CPT425-SERRA",
            "productNo": "1234567",
            "completed": completed,
        }))
        .unwrap()
    }

    #[test]
    fn placeholders_fill_gaps() {
        let slots = block_slots(&[machine("b", 4, false), machine("a", 2, false)], 5);
        assert_eq!(slots.len(), 5);
        let occupied: Vec<(u32, Option<&str>)> = slots
            .iter()
            .map(|s| (s.block_no, s.machine.as_ref().map(|m| m.id.as_str())))
            .collect();
        assert_eq!(
            occupied,
            vec![(1, None), (2, Some("a")), (3, None), (4, Some("b")), (5, None)]
        );
    }

    #[test]
    fn skips_completed_and_out_of_range() {
        let slots = block_slots(
            &[machine("done", 1, true), machine("far", 13, false), machine("zero", 0, false)],
            12,
        );
        assert!(slots.iter().all(Slot::is_empty));
    }
}
