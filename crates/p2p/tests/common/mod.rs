//! Hand-rolled collaborator doubles shared by the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use arden_core::{BlockSummary, Delegate, PublicKey};
use arden_p2p::{
    ChainStore, Clock, EventPublisher, P2pError, P2pResult, PeerContact, PeerPong,
    TransactionPool,
};
use async_trait::async_trait;
use serde_json::json;

/// A deterministic delegate key; `index` selects the repeated byte.
pub fn delegate_key(index: usize) -> PublicKey {
    PublicKey::new(format!("02{}", format!("{index:02x}").repeat(32))).unwrap()
}

/// Two delegates with wallet attributes, as a chain store would hand out.
pub fn two_delegates() -> Vec<Delegate> {
    vec![
        Delegate::new(delegate_key(1), 1).with_attribute(json!({ "username": "genesis_1" })),
        Delegate::new(delegate_key(2), 2).with_attribute(json!({ "username": "genesis_2" })),
    ]
}

/// The last-block fixture the suites anchor on.
pub fn last_block_fixture() -> BlockSummary {
    BlockSummary::new("17184958558311101492", 1760, 97456, delegate_key(1))
}

/// Chain store serving fixed answers.
pub struct FixtureChain {
    pub last_block: BlockSummary,
    pub delegates: Vec<Delegate>,
}

impl FixtureChain {
    pub fn new(last_block: BlockSummary, delegates: Vec<Delegate>) -> Self {
        Self {
            last_block,
            delegates,
        }
    }
}

#[async_trait]
impl ChainStore for FixtureChain {
    async fn get_last_block(&self) -> P2pResult<BlockSummary> {
        Ok(self.last_block.clone())
    }

    async fn get_active_delegates(&self) -> P2pResult<Vec<Delegate>> {
        Ok(self.delegates.clone())
    }
}

/// Chain store that counts completed `get_last_block` calls, one per
/// monitor cycle.
pub struct CountingChain {
    pub last_block: BlockSummary,
    completed: AtomicUsize,
}

impl CountingChain {
    pub fn new(last_block: BlockSummary) -> Self {
        Self {
            last_block,
            completed: AtomicUsize::new(0),
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainStore for CountingChain {
    async fn get_last_block(&self) -> P2pResult<BlockSummary> {
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(self.last_block.clone())
    }

    async fn get_active_delegates(&self) -> P2pResult<Vec<Delegate>> {
        Ok(Vec::new())
    }
}

/// Chain store whose answers are released one permit at a time, for
/// holding a monitor cycle in flight.
pub struct GatedChain {
    pub last_block: BlockSummary,
    gate: tokio::sync::Semaphore,
    completed: AtomicUsize,
}

impl GatedChain {
    pub fn new(last_block: BlockSummary) -> Self {
        Self {
            last_block,
            gate: tokio::sync::Semaphore::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn release(&self, cycles: usize) {
        self.gate.add_permits(cycles);
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainStore for GatedChain {
    async fn get_last_block(&self) -> P2pResult<BlockSummary> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| P2pError::ChainStore("gate closed".to_string()))?;
        permit.forget();
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(self.last_block.clone())
    }

    async fn get_active_delegates(&self) -> P2pResult<Vec<Delegate>> {
        Ok(Vec::new())
    }
}

/// Chain store whose backing storage is down.
pub struct FailingChain;

#[async_trait]
impl ChainStore for FailingChain {
    async fn get_last_block(&self) -> P2pResult<BlockSummary> {
        Err(P2pError::ChainStore("backing store offline".to_string()))
    }

    async fn get_active_delegates(&self) -> P2pResult<Vec<Delegate>> {
        Err(P2pError::ChainStore("backing store offline".to_string()))
    }
}

/// Transaction pool over a fixed backlog.
pub struct FixturePool {
    pub size: usize,
    pub backlog: Vec<Vec<u8>>,
}

#[async_trait]
impl TransactionPool for FixturePool {
    async fn pool_size(&self) -> P2pResult<usize> {
        Ok(self.size)
    }

    async fn candidate_transactions(&self, limit: usize) -> P2pResult<Vec<Vec<u8>>> {
        Ok(self.backlog.iter().take(limit).cloned().collect())
    }
}

/// Event sink that records every dispatch.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingPublisher {
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn payloads_of(&self, event: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn dispatch(&self, event: &str, payload: serde_json::Value) {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload));
    }
}

/// How a scripted peer answers a ping.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer immediately with this height and optional header.
    Pong {
        height: u64,
        header: Option<serde_json::Value>,
    },
    /// Fail immediately.
    Refuse,
    /// Never answer; only the caller's timeout ends the wait.
    Hang,
}

/// Peer contact whose behaviour is scripted per address.
#[derive(Default)]
pub struct ScriptedContact {
    scripts: Mutex<HashMap<IpAddr, Script>>,
    pings: Mutex<HashMap<IpAddr, usize>>,
}

impl ScriptedContact {
    pub fn script(&self, address: IpAddr, script: Script) {
        self.scripts.lock().unwrap().insert(address, script);
    }

    pub fn pings(&self, address: IpAddr) -> usize {
        self.pings.lock().unwrap().get(&address).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PeerContact for ScriptedContact {
    async fn ping(&self, address: IpAddr, _port: u16) -> P2pResult<PeerPong> {
        *self.pings.lock().unwrap().entry(address).or_insert(0) += 1;
        let script = self.scripts.lock().unwrap().get(&address).cloned();
        match script {
            Some(Script::Pong { height, header }) => Ok(PeerPong { height, header }),
            Some(Script::Refuse) | None => Err(P2pError::PeerContact(format!(
                "{address} refused the connection"
            ))),
            Some(Script::Hang) => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Err(P2pError::PeerContact("woke from eternal sleep".to_string()))
            }
        }
    }
}

/// A clock frozen at construction time.
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn chain_time(&self) -> u64 {
        self.0
    }
}
