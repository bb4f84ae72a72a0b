//! The consensus query facade.

use std::sync::Arc;

use arden_consensus::{calculate_forging_info, calculate_round, SlotConfig};
use arden_core::{BlockSummary, Delegate};
use serde::{Deserialize, Serialize};

use crate::config::P2pConfig;
use crate::error::{P2pResult, PeerRejection};
use crate::monitor::NetworkMonitor;
use crate::network_state::NetworkState;
use crate::peer::Peer;
use crate::processor::{PeerCandidate, PeerProcessor};
use crate::services::{ChainStore, Clock, EventPublisher, TransactionPool};

/// Pool snapshot handed to a forger building a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnconfirmedTransactions {
    /// Total number of transactions waiting in the pool.
    pub pool_size: usize,
    /// Hex-serialized candidates, capped at the per-block limit.
    pub transactions: Vec<String>,
}

/// Everything a forger needs to know about the round in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRound {
    /// Round covering the height being forged.
    pub round: u64,
    /// First height of that round.
    pub round_height: u64,
    /// The round that follows.
    pub next_round: u64,
    /// Number of delegates the layout was computed for.
    pub max_delegates: u32,
    /// Timestamp the block forged in the current slot would carry.
    pub timestamp: u64,
    /// The full active schedule, in forging order.
    pub delegates: Vec<Delegate>,
    /// Owner of the current slot.
    pub current_forger: Delegate,
    /// Owner of the following slot.
    pub next_forger: Delegate,
    /// Whether forging is allowed right now, network health included.
    pub can_forge: bool,
    /// The block the round computation is anchored on.
    pub last_block: BlockSummary,
}

/// The one surface the surrounding node talks to.
///
/// Every method is a thin pass-through to the owning component; the facade
/// adds no policy of its own beyond composing `current_round`.
pub struct ConsensusApi {
    processor: Arc<PeerProcessor>,
    monitor: Arc<NetworkMonitor>,
    chain: Arc<dyn ChainStore>,
    pool: Arc<dyn TransactionPool>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    slots: SlotConfig,
    block_max_transactions: usize,
}

impl ConsensusApi {
    /// Wires the facade over its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        processor: Arc<PeerProcessor>,
        monitor: Arc<NetworkMonitor>,
        chain: Arc<dyn ChainStore>,
        pool: Arc<dyn TransactionPool>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        slots: SlotConfig,
        config: &P2pConfig,
    ) -> Self {
        Self {
            processor,
            monitor,
            chain,
            pool,
            publisher,
            clock,
            slots,
            block_max_transactions: config.block_max_transactions,
        }
    }

    /// Runs admission control on a peer announcement.
    pub async fn accept_peer(&self, candidate: PeerCandidate) -> Result<Peer, PeerRejection> {
        self.processor.validate_and_accept(candidate).await
    }

    /// Dispatches a domain event on behalf of the caller.
    pub fn emit_event(&self, event: &str, payload: serde_json::Value) {
        self.publisher.dispatch(event, payload);
    }

    /// Pool size plus up to the per-block cap of hex-serialized candidates.
    pub async fn unconfirmed_transactions(&self) -> P2pResult<UnconfirmedTransactions> {
        let pool_size = self.pool.pool_size().await?;
        let transactions = self
            .pool
            .candidate_transactions(self.block_max_transactions)
            .await?
            .into_iter()
            .map(hex::encode)
            .collect();

        Ok(UnconfirmedTransactions {
            pool_size,
            transactions,
        })
    }

    /// Composes the full round report for the height being forged.
    pub async fn current_round(&self) -> P2pResult<CurrentRound> {
        let last_block = self.chain.get_last_block().await?;
        let delegates = self.chain.get_active_delegates().await?;

        let forging_height = last_block.height + 1;
        let round = calculate_round(forging_height, delegates.len() as u32)?;
        let forging = calculate_forging_info(
            last_block.timestamp,
            self.clock.chain_time(),
            &delegates,
            &self.slots,
        )?;

        let network = self.monitor.network_state().await;
        let current_forger = delegates[forging.current_forger_index as usize].clone();
        let next_forger = delegates[forging.next_forger_index as usize].clone();

        Ok(CurrentRound {
            round: round.round,
            round_height: round.round_height,
            next_round: round.next_round,
            max_delegates: round.max_delegates,
            timestamp: forging.block_timestamp,
            delegates,
            current_forger,
            next_forger,
            can_forge: forging.can_forge && network.allows_forging(),
            last_block,
        })
    }

    /// The monitor's cached verdict.
    pub async fn network_state(&self) -> NetworkState {
        self.monitor.network_state().await
    }

    /// Nudges the monitor into an immediate refresh cycle.
    pub fn force_sync(&self) {
        self.monitor.force_wakeup();
    }
}
