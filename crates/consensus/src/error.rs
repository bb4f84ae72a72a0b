//! Scheduling contract violations.

use thiserror::Error;

/// A caller handed the scheduler arguments outside its contract.
///
/// These are programming or wiring errors, not recoverable runtime
/// conditions: the scheduler never guesses a fallback schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// Heights are 1-based; 0 never identifies a block.
    #[error("block height must be at least 1, got {0}")]
    InvalidHeight(u64),
    /// A round cannot be laid out over zero delegates.
    #[error("active delegate count must be at least 1, got {0}")]
    InvalidDelegateCount(u32),
    /// The forging schedule has no entries to rotate over.
    #[error("delegate schedule must not be empty")]
    EmptySchedule,
    /// The reserved tail must leave a non-empty forging window.
    #[error(
        "slot duration of {slot_duration_secs}s leaves no forging window \
         before a {reserved_tail_secs}s propagation tail"
    )]
    InvalidSlotConfig {
        /// Configured slot length in seconds.
        slot_duration_secs: u64,
        /// Configured propagation tail in seconds.
        reserved_tail_secs: u64,
    },
    /// The clock reads earlier than the reference block was forged.
    #[error("current time {now} is before the block timestamp {block_timestamp}")]
    ClockBehindBlock {
        /// Timestamp of the reference block, in epoch seconds.
        block_timestamp: u64,
        /// Observed chain time, in epoch seconds.
        now: u64,
    },
}
