//! Development-mode collaborators.
//!
//! Stand-ins for the chain, the pool, the event bus and the peer transport
//! so the peer layer can run as a single process. The chain never grows past
//! genesis, the pool is empty, events go to the log and every peer contact
//! fails until a real transport is wired in.

use std::net::IpAddr;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use arden_core::{BlockSummary, Delegate, PublicKey};
use arden_p2p::{
    ChainStore, EventPublisher, P2pError, P2pResult, PeerContact, PeerPong, TransactionPool,
};

/// Block id reported for the development genesis block.
const GENESIS_BLOCK_ID: &str = "11796403019373244756";

/// Chain store pinned at genesis, with the configured keys as the active
/// delegate schedule.
pub struct DevChainStore {
    delegates: Vec<Delegate>,
}

impl DevChainStore {
    /// Builds the store from the configured forging order. Ranks are
    /// assigned by position, starting at 1.
    pub fn new(keys: Vec<PublicKey>) -> Self {
        let delegates = keys
            .into_iter()
            .enumerate()
            .map(|(index, key)| {
                let rank = index as u32 + 1;
                Delegate::new(key, rank)
                    .with_attribute(json!({ "username": format!("genesis_{rank}") }))
            })
            .collect();
        Self { delegates }
    }
}

#[async_trait]
impl ChainStore for DevChainStore {
    async fn get_last_block(&self) -> P2pResult<BlockSummary> {
        let generator = self
            .delegates
            .first()
            .map(|delegate| delegate.public_key.clone())
            .ok_or_else(|| P2pError::ChainStore("no delegates configured".to_string()))?;
        Ok(BlockSummary::new(GENESIS_BLOCK_ID, 1, 0, generator))
    }

    async fn get_active_delegates(&self) -> P2pResult<Vec<Delegate>> {
        if self.delegates.is_empty() {
            return Err(P2pError::ChainStore("no delegates configured".to_string()));
        }
        Ok(self.delegates.clone())
    }
}

/// Transaction pool with nothing in it.
pub struct EmptyTransactionPool;

#[async_trait]
impl TransactionPool for EmptyTransactionPool {
    async fn pool_size(&self) -> P2pResult<usize> {
        Ok(0)
    }

    async fn candidate_transactions(&self, _limit: usize) -> P2pResult<Vec<Vec<u8>>> {
        Ok(Vec::new())
    }
}

/// Event sink that writes every dispatch to the log.
pub struct LogEventPublisher;

impl EventPublisher for LogEventPublisher {
    fn dispatch(&self, event: &str, payload: serde_json::Value) {
        info!(event, %payload, "event dispatched");
    }
}

/// Peer contact for a node with no transport yet; every ping fails, so the
/// monitor sees an unreachable network.
pub struct UnreachablePeerContact;

#[async_trait]
impl PeerContact for UnreachablePeerContact {
    async fn ping(&self, address: IpAddr, port: u16) -> P2pResult<PeerPong> {
        Err(P2pError::PeerContact(format!(
            "no transport wired for {address}:{port}"
        )))
    }
}
