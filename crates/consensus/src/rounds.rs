//! Round arithmetic.
//!
//! A round is the span of consecutive heights in which every active delegate
//! forges exactly once. With `n` active delegates, round `r` covers heights
//! `[(r-1)*n + 1, r*n]`; genesis sits at height 1, round 1.

use serde::{Deserialize, Serialize};

use crate::error::ContractViolation;

/// Where a height falls in the round layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundInfo {
    /// 1-based round number.
    pub round: u64,
    /// First height of the round.
    pub round_height: u64,
    /// The round that follows.
    pub next_round: u64,
    /// Number of delegates the layout was computed for.
    pub max_delegates: u32,
}

/// Computes the round layout for `height` under `active_delegate_count`
/// delegates.
pub fn calculate_round(
    height: u64,
    active_delegate_count: u32,
) -> Result<RoundInfo, ContractViolation> {
    if height == 0 {
        return Err(ContractViolation::InvalidHeight(height));
    }
    if active_delegate_count == 0 {
        return Err(ContractViolation::InvalidDelegateCount(
            active_delegate_count,
        ));
    }

    let n = u64::from(active_delegate_count);
    let round = (height - 1) / n + 1;
    let round_height = (round - 1) * n + 1;

    Ok(RoundInfo {
        round,
        round_height,
        next_round: round + 1,
        max_delegates: active_delegate_count,
    })
}

/// Whether `height` opens a new round, meaning a fresh delegate schedule
/// takes effect at this height.
pub fn is_new_round(height: u64, active_delegate_count: u32) -> Result<bool, ContractViolation> {
    let info = calculate_round(height, active_delegate_count)?;
    Ok(info.round_height == height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_opens_round_one() {
        let info = calculate_round(1, 51).unwrap();
        assert_eq!(info.round, 1);
        assert_eq!(info.round_height, 1);
        assert_eq!(info.next_round, 2);
        assert_eq!(info.max_delegates, 51);
    }

    #[test]
    fn test_second_height_stays_in_round_one() {
        let info = calculate_round(2, 71).unwrap();
        assert_eq!(info.round, 1);
        assert_eq!(info.round_height, 1);
        assert_eq!(info.next_round, 2);
        assert_eq!(info.max_delegates, 71);
        assert!(!is_new_round(2, 71).unwrap());
    }

    #[test]
    fn test_round_boundaries_with_51_delegates() {
        assert_eq!(calculate_round(51, 51).unwrap().round, 1);
        let info = calculate_round(52, 51).unwrap();
        assert_eq!(info.round, 2);
        assert_eq!(info.round_height, 52);
        assert_eq!(info.next_round, 3);
    }

    #[test]
    fn test_mid_round_keeps_round_height() {
        let info = calculate_round(1760, 71).unwrap();
        assert_eq!(info.round, 25);
        assert_eq!(info.round_height, 1705);
        assert_eq!(info.next_round, 26);
    }

    #[test]
    fn test_single_delegate_rounds() {
        for height in 1..=5 {
            let info = calculate_round(height, 1).unwrap();
            assert_eq!(info.round, height);
            assert_eq!(info.round_height, height);
        }
    }

    #[test]
    fn test_is_new_round_at_boundaries_only() {
        assert!(is_new_round(1, 51).unwrap());
        assert!(!is_new_round(2, 51).unwrap());
        assert!(!is_new_round(51, 51).unwrap());
        assert!(is_new_round(52, 51).unwrap());
        assert!(is_new_round(103, 51).unwrap());
    }

    #[test]
    fn test_rejects_height_zero() {
        assert_eq!(
            calculate_round(0, 51),
            Err(ContractViolation::InvalidHeight(0))
        );
        assert_eq!(
            is_new_round(0, 51),
            Err(ContractViolation::InvalidHeight(0))
        );
    }

    #[test]
    fn test_rejects_zero_delegates() {
        assert_eq!(
            calculate_round(10, 0),
            Err(ContractViolation::InvalidDelegateCount(0))
        );
    }
}
