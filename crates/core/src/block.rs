//! Block summaries as the consensus layer sees them.

use serde::{Deserialize, Serialize};

use crate::keys::PublicKey;

/// The slice of a block header that scheduling and round reports need.
///
/// `timestamp` counts seconds since the network epoch, not the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    /// Block identifier as the chain store renders it.
    pub id: String,
    /// Height of the block, starting at 1 for genesis.
    pub height: u64,
    /// Seconds since the network epoch at which the block was forged.
    pub timestamp: u64,
    /// Identity of the delegate that forged the block.
    pub generator_public_key: PublicKey,
}

impl BlockSummary {
    /// Creates a block summary.
    pub fn new(
        id: impl Into<String>,
        height: u64,
        timestamp: u64,
        generator_public_key: PublicKey,
    ) -> Self {
        Self {
            id: id.into(),
            height,
            timestamp,
            generator_public_key,
        }
    }
}
