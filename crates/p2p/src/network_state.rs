//! Network-state snapshots and their evaluator.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::config::P2pConfig;
use crate::peer::Peer;

/// Coarse verdict on whether the network view is trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkStateStatus {
    /// A meaningful sample was evaluated; `quorum` is the verdict.
    Default,
    /// No peers yet and quorum has never been reached since boot.
    ColdStart,
    /// Too few peers for the verdict to mean anything.
    NotEnoughPeers,
    /// Sampling is bypassed by configuration.
    Test,
}

impl NetworkStateStatus {
    /// Only a `Default` verdict may unlock forging.
    pub fn allows_forging(&self) -> bool {
        matches!(self, NetworkStateStatus::Default)
    }
}

impl fmt::Display for NetworkStateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkStateStatus::Default => "default",
            NetworkStateStatus::ColdStart => "cold-start",
            NetworkStateStatus::NotEnoughPeers => "not-enough-peers",
            NetworkStateStatus::Test => "test",
        })
    }
}

/// Evidence of a peer claiming to be ahead of the local chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverHeightHeader {
    /// Address of the claiming peer.
    pub address: IpAddr,
    /// Port of the claiming peer.
    pub port: u16,
    /// Height the peer claims.
    pub height: u64,
    /// Header the peer announced, untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<serde_json::Value>,
}

/// Immutable result of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    /// The verdict.
    pub status: NetworkStateStatus,
    /// Number of peers that went into the evaluation.
    pub sample_size: usize,
    /// Local chain height at evaluation time.
    pub local_height: u64,
    /// Median of the sampled peer heights, 0 for an empty sample.
    pub median_height: u64,
    /// Fraction of the sample within the height tolerance of the local
    /// chain. 0 when the sample was unusable, 1 under test mode.
    pub quorum: f64,
    /// Peers claiming heights beyond the tolerance, with their evidence.
    pub over_height: Vec<OverHeightHeader>,
}

impl NetworkState {
    /// Shorthand for `status.allows_forging()`.
    pub fn allows_forging(&self) -> bool {
        self.status.allows_forging()
    }
}

/// Pure function from a peer sample to a [`NetworkState`].
///
/// Holds only configuration; every evaluation is a function of its
/// arguments, so equal inputs always produce equal snapshots.
#[derive(Debug, Clone)]
pub struct NetworkStateEvaluator {
    min_peers: usize,
    height_tolerance: u64,
    test_mode: bool,
}

impl NetworkStateEvaluator {
    /// Creates an evaluator from the peer-layer configuration.
    pub fn new(config: &P2pConfig) -> Self {
        Self {
            min_peers: config.min_peers,
            height_tolerance: config.height_tolerance,
            test_mode: config.test_mode,
        }
    }

    /// Evaluates a snapshot of the registry against the local height.
    ///
    /// `ever_reached_quorum` is the boot latch owned by the monitor; it
    /// separates a cold start from a network that went quiet later.
    pub fn evaluate(
        &self,
        peers: &[Peer],
        local_height: u64,
        ever_reached_quorum: bool,
    ) -> NetworkState {
        if self.test_mode {
            return NetworkState {
                status: NetworkStateStatus::Test,
                sample_size: peers.len(),
                local_height,
                median_height: local_height,
                quorum: 1.0,
                over_height: Vec::new(),
            };
        }

        let sample_size = peers.len();
        let median_height = median_of(peers);
        let over_height = peers
            .iter()
            .filter(|peer| peer.height > local_height.saturating_add(self.height_tolerance))
            .map(|peer| OverHeightHeader {
                address: peer.address,
                port: peer.port,
                height: peer.height,
                header: peer.last_block_header.clone(),
            })
            .collect();

        if sample_size == 0 && !ever_reached_quorum {
            return NetworkState {
                status: NetworkStateStatus::ColdStart,
                sample_size,
                local_height,
                median_height,
                quorum: 0.0,
                over_height,
            };
        }

        if sample_size < self.min_peers {
            return NetworkState {
                status: NetworkStateStatus::NotEnoughPeers,
                sample_size,
                local_height,
                median_height,
                quorum: 0.0,
                over_height,
            };
        }

        let agreeing = peers
            .iter()
            .filter(|peer| peer.height.abs_diff(local_height) <= self.height_tolerance)
            .count();
        let quorum = if sample_size == 0 {
            0.0
        } else {
            agreeing as f64 / sample_size as f64
        };

        NetworkState {
            status: NetworkStateStatus::Default,
            sample_size,
            local_height,
            median_height,
            quorum,
            over_height,
        }
    }
}

fn median_of(peers: &[Peer]) -> u64 {
    if peers.is_empty() {
        return 0;
    }
    let mut heights: Vec<u64> = peers.iter().map(|peer| peer.height).collect();
    heights.sort_unstable();
    let mid = heights.len() / 2;
    if heights.len() % 2 == 1 {
        heights[mid]
    } else {
        ((u128::from(heights[mid - 1]) + u128::from(heights[mid])) / 2) as u64
    }
}
