//! Capability traits the peer layer is wired against.
//!
//! Everything the layer needs from the rest of the node comes in through
//! these seams at construction time. There is no ambient lookup: a caller
//! hands in `Arc<dyn ...>` implementations and owns their lifecycle.

use std::net::IpAddr;

use arden_core::{BlockSummary, Delegate};
use async_trait::async_trait;

use crate::error::P2pResult;

/// Domain event names dispatched by the peer layer.
pub mod events {
    /// A peer passed admission and entered the registry.
    pub const PEER_ADDED: &str = "peer.added";
    /// A peer was dropped from the registry.
    pub const PEER_REMOVED: &str = "peer.removed";
}

/// Read access to the local chain.
#[async_trait]
pub trait ChainStore: Send + Sync {
    /// The most recently accepted block.
    async fn get_last_block(&self) -> P2pResult<BlockSummary>;

    /// The active delegate schedule, in forging order.
    async fn get_active_delegates(&self) -> P2pResult<Vec<Delegate>>;
}

/// Read access to the unconfirmed-transaction pool.
#[async_trait]
pub trait TransactionPool: Send + Sync {
    /// Number of transactions waiting in the pool.
    async fn pool_size(&self) -> P2pResult<usize>;

    /// Up to `limit` serialized transactions eligible for the next block.
    async fn candidate_transactions(&self, limit: usize) -> P2pResult<Vec<Vec<u8>>>;
}

/// What a peer reported back when contacted.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerPong {
    /// Chain height the peer claims.
    pub height: u64,
    /// Last block header the peer announced, if it sent one.
    pub header: Option<serde_json::Value>,
}

/// Ability to reach a peer over the wire.
#[async_trait]
pub trait PeerContact: Send + Sync {
    /// Contacts `address:port` and returns its claimed chain position.
    async fn ping(&self, address: IpAddr, port: u16) -> P2pResult<PeerPong>;
}

/// Fire-and-forget domain event sink.
pub trait EventPublisher: Send + Sync {
    /// Dispatches `event` with `payload` to whoever is listening.
    fn dispatch(&self, event: &str, payload: serde_json::Value);
}

/// Source of chain time.
pub trait Clock: Send + Sync {
    /// Seconds since the network epoch.
    fn chain_time(&self) -> u64;
}

/// Wall-clock [`Clock`] anchored at the network epoch.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch_unix_secs: u64,
}

impl SystemClock {
    /// Creates a clock for a network whose epoch is `epoch_unix_secs` on
    /// the Unix timeline.
    pub fn new(epoch_unix_secs: u64) -> Self {
        Self { epoch_unix_secs }
    }
}

impl Clock for SystemClock {
    fn chain_time(&self) -> u64 {
        let unix_now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        unix_now.saturating_sub(self.epoch_unix_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_counts_from_the_network_epoch() {
        let unix_now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let at_epoch = SystemClock::new(unix_now - 100);
        let elapsed = at_epoch.chain_time();
        assert!((100..110).contains(&elapsed));

        let future_epoch = SystemClock::new(unix_now + 1_000_000);
        assert_eq!(future_epoch.chain_time(), 0);
    }
}
