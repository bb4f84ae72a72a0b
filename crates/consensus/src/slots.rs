//! Forging-slot scheduling.
//!
//! Time since the last block is divided into fixed slots, one delegate per
//! slot, rotating through the active schedule in order. The final seconds of
//! each slot are reserved for block propagation: a delegate that has not
//! forged by then stays quiet so its block does not race the next slot.

use arden_core::Delegate;
use serde::{Deserialize, Serialize};

use crate::error::ContractViolation;

/// Slot length if the chain parameters do not say otherwise.
pub const DEFAULT_SLOT_DURATION_SECS: u64 = 8;
/// Propagation tail if the chain parameters do not say otherwise.
pub const DEFAULT_RESERVED_TAIL_SECS: u64 = 2;

/// Timing parameters of the slot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Seconds each delegate owns a slot.
    pub slot_duration_secs: u64,
    /// Trailing seconds of every slot reserved for propagation.
    pub reserved_tail_secs: u64,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            slot_duration_secs: DEFAULT_SLOT_DURATION_SECS,
            reserved_tail_secs: DEFAULT_RESERVED_TAIL_SECS,
        }
    }
}

impl SlotConfig {
    /// Checks that the parameters leave a non-empty forging window.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.slot_duration_secs == 0 || self.reserved_tail_secs >= self.slot_duration_secs {
            return Err(ContractViolation::InvalidSlotConfig {
                slot_duration_secs: self.slot_duration_secs,
                reserved_tail_secs: self.reserved_tail_secs,
            });
        }
        Ok(())
    }

    /// Seconds of each slot during which forging is allowed.
    pub fn forging_window_secs(&self) -> u64 {
        self.slot_duration_secs.saturating_sub(self.reserved_tail_secs)
    }
}

/// Who owns the current slot and whether it is still open for forging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgingInfo {
    /// Chain timestamp at which the current slot began.
    pub block_timestamp: u64,
    /// Schedule index of the delegate owning the current slot.
    pub current_forger_index: u32,
    /// Schedule index of the delegate owning the following slot.
    pub next_forger_index: u32,
    /// Whether the current slot is still inside its forging window.
    pub can_forge: bool,
}

/// Positions `now` on the slot grid anchored at `block_timestamp` and maps
/// the slot onto `delegate_order`.
///
/// Rotation follows the order of the schedule exactly as given; ranks or
/// attributes of the entries play no part here.
pub fn calculate_forging_info(
    block_timestamp: u64,
    now: u64,
    delegate_order: &[Delegate],
    config: &SlotConfig,
) -> Result<ForgingInfo, ContractViolation> {
    config.validate()?;
    if delegate_order.is_empty() {
        return Err(ContractViolation::EmptySchedule);
    }
    let Some(elapsed) = now.checked_sub(block_timestamp) else {
        return Err(ContractViolation::ClockBehindBlock {
            block_timestamp,
            now,
        });
    };

    let slot = elapsed / config.slot_duration_secs;
    let position_in_slot = elapsed % config.slot_duration_secs;
    let schedule_len = delegate_order.len() as u64;

    Ok(ForgingInfo {
        block_timestamp: block_timestamp + slot * config.slot_duration_secs,
        current_forger_index: (slot % schedule_len) as u32,
        next_forger_index: ((slot + 1) % schedule_len) as u32,
        can_forge: position_in_slot < config.forging_window_secs(),
    })
}
