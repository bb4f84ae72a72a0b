//! The peer registry.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::config::P2pConfig;
use crate::peer::{unix_time_ms, Peer};

/// What happened when a peer record was offered to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The peer was inserted into free capacity.
    Added,
    /// The registry was full; the stalest eligible record made room.
    Evicted {
        /// The record that was dropped to admit the new peer.
        removed: Peer,
    },
    /// An existing record with a lapsed ban was overwritten.
    Replaced,
    /// The peer is already registered; nothing changed.
    Duplicate,
}

/// Bounded, concurrency-safe store of peer records keyed by socket address.
///
/// The registry only stores; deciding who gets in is admission control's
/// job, and deciding who goes is the monitor's. The one policy it owns is
/// capacity: past `max_peers` it evicts the stalest record, but never
/// shrinks the set at or below `min_peer_floor`.
#[derive(Clone)]
pub struct PeerRegistry {
    peers: Arc<RwLock<HashMap<SocketAddr, Peer>>>,
    max_peers: usize,
    min_peer_floor: usize,
}

impl PeerRegistry {
    /// Creates an empty registry sized per `config`.
    pub fn new(config: &P2pConfig) -> Self {
        Self {
            peers: Arc::new(RwLock::new(HashMap::new())),
            max_peers: config.max_peers,
            min_peer_floor: config.min_peer_floor,
        }
    }

    /// Offers a record to the registry.
    ///
    /// A live existing record wins over the newcomer; a record whose ban has
    /// lapsed loses its slot. At capacity the stalest record is evicted
    /// first, unless the registry already sits at the floor.
    pub async fn add(&self, peer: Peer) -> AddOutcome {
        let key = peer.socket_addr();
        let mut peers = self.peers.write().await;

        if let Some(existing) = peers.get(&key) {
            if existing.ban_lapsed(unix_time_ms()) {
                debug!(peer_addr = %key, "replacing peer record with lapsed ban");
                peers.insert(key, peer);
                return AddOutcome::Replaced;
            }
            return AddOutcome::Duplicate;
        }

        let mut evicted = None;
        if peers.len() >= self.max_peers && peers.len() > self.min_peer_floor {
            let stalest = peers
                .values()
                .min_by_key(|candidate| candidate.last_seen_ms)
                .map(Peer::socket_addr);
            if let Some(stale_key) = stalest {
                evicted = peers.remove(&stale_key);
                debug!(
                    peer_addr = %stale_key,
                    "evicting stalest peer to admit a new one"
                );
            }
        }

        peers.insert(key, peer);
        match evicted {
            Some(removed) => AddOutcome::Evicted { removed },
            None => AddOutcome::Added,
        }
    }

    /// Removes a record, returning it if present.
    pub async fn remove(&self, addr: &SocketAddr) -> Option<Peer> {
        self.peers.write().await.remove(addr)
    }

    /// Looks up a record by socket address.
    pub async fn get(&self, addr: &SocketAddr) -> Option<Peer> {
        self.peers.read().await.get(addr).cloned()
    }

    /// A point-in-time snapshot of every record.
    pub async fn list(&self) -> Vec<Peer> {
        self.peers.read().await.values().cloned().collect()
    }

    /// Number of records currently held.
    pub async fn count(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Folds a successful contact into a record. Returns false if the peer
    /// has disappeared in the meantime.
    pub async fn record_contact(
        &self,
        addr: &SocketAddr,
        height: u64,
        latency_ms: u64,
        header: Option<serde_json::Value>,
    ) -> bool {
        let mut peers = self.peers.write().await;
        match peers.get_mut(addr) {
            Some(peer) => {
                peer.record_contact(height, latency_ms, header);
                true
            }
            None => false,
        }
    }

    /// Marks a peer banned until `until_ms`. Returns false if unknown.
    pub async fn ban(&self, addr: &SocketAddr, until_ms: u64) -> bool {
        let mut peers = self.peers.write().await;
        match peers.get_mut(addr) {
            Some(peer) => {
                peer.banned_until_ms = Some(until_ms);
                true
            }
            None => false,
        }
    }
}
