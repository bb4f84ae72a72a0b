//! # Arden Consensus
//!
//! DPoS scheduling arithmetic for the Arden node.
//!
//! Two pure calculators live here: [`rounds`] lays heights out into rounds
//! of one-block-per-delegate, and [`slots`] positions wall-clock time on the
//! slot grid to decide who may forge right now. Both are deterministic and
//! side-effect free; anything stateful (peer health, chain access) belongs
//! to the layers above.

/// Scheduling contract violations
pub mod error;
/// Round arithmetic
pub mod rounds;
/// Forging-slot scheduling
pub mod slots;

pub use error::ContractViolation;
pub use rounds::{calculate_round, is_new_round, RoundInfo};
pub use slots::{
    calculate_forging_info, ForgingInfo, SlotConfig, DEFAULT_RESERVED_TAIL_SECS,
    DEFAULT_SLOT_DURATION_SECS,
};
