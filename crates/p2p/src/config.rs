//! Peer-layer configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::peer::ProtocolVersion;

/// Default peer-to-peer port.
pub const DEFAULT_P2P_PORT: u16 = 4710;
/// Default registry capacity.
pub const DEFAULT_MAX_PEERS: usize = 500;
/// Default floor below which eviction never runs.
pub const DEFAULT_MIN_PEER_FLOOR: usize = 20;
/// Default minimum sample size for a meaningful verdict.
pub const DEFAULT_MIN_PEERS: usize = 20;
/// Default quorum threshold.
pub const DEFAULT_MIN_QUORUM: f64 = 0.66;
/// Default per-peer contact timeout in milliseconds.
pub const DEFAULT_CONTACT_TIMEOUT_MS: u64 = 2_000;
/// Default refresh cadence in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 8_000;
/// Default minimum peer protocol version.
pub const DEFAULT_MIN_VERSION: ProtocolVersion = ProtocolVersion::new(2, 0, 0);
/// Default cap on transactions handed out per block template.
pub const DEFAULT_BLOCK_MAX_TRANSACTIONS: usize = 150;

/// Tunables for the peer registry, admission control and the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct P2pConfig {
    /// Address this node advertises to others.
    pub advertised_address: IpAddr,
    /// Port this node advertises to others.
    pub advertised_port: u16,
    /// Hard capacity of the peer registry.
    pub max_peers: usize,
    /// Registry size at or below which eviction never runs.
    pub min_peer_floor: usize,
    /// Smallest sample the evaluator accepts as meaningful.
    pub min_peers: usize,
    /// Height difference still counted as agreement.
    pub height_tolerance: u64,
    /// Fraction of agreeing peers required for quorum.
    pub min_quorum: f64,
    /// How long a single peer contact may take, in milliseconds.
    pub contact_timeout_ms: u64,
    /// Pause between refresh cycles, in milliseconds.
    pub refresh_interval_ms: u64,
    /// Lowest protocol version admitted.
    pub min_version: ProtocolVersion,
    /// Report `Test` status unconditionally; meant for single-node setups.
    pub test_mode: bool,
    /// Cap on transactions handed out per block template.
    pub block_max_transactions: usize,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            advertised_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            advertised_port: DEFAULT_P2P_PORT,
            max_peers: DEFAULT_MAX_PEERS,
            min_peer_floor: DEFAULT_MIN_PEER_FLOOR,
            min_peers: DEFAULT_MIN_PEERS,
            height_tolerance: 0,
            min_quorum: DEFAULT_MIN_QUORUM,
            contact_timeout_ms: DEFAULT_CONTACT_TIMEOUT_MS,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            min_version: DEFAULT_MIN_VERSION,
            test_mode: false,
            block_max_transactions: DEFAULT_BLOCK_MAX_TRANSACTIONS,
        }
    }
}

impl P2pConfig {
    /// The endpoint this node advertises, used for self-connection checks.
    pub fn advertised_socket(&self) -> SocketAddr {
        SocketAddr::new(self.advertised_address, self.advertised_port)
    }
}
