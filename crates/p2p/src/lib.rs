//! # Arden P2P
//!
//! Peer health and network state for the Arden node.
//!
//! The crate answers two questions the consensus layer keeps asking: is the
//! network view trustworthy enough to forge, and who are we hearing it from.
//! A bounded [`registry::PeerRegistry`] holds peer records, admission runs
//! through [`processor::PeerProcessor`], a background
//! [`monitor::NetworkMonitor`] keeps a cached [`network_state::NetworkState`]
//! fresh, and [`api::ConsensusApi`] is the single facade the surrounding
//! node calls. Chain access, the transaction pool, the wire transport, event
//! delivery and time all come in through the [`services`] traits.

/// Consensus query facade
pub mod api;
/// Peer-layer configuration
pub mod config;
/// Error types
pub mod error;
/// Background state refresh
pub mod monitor;
/// Network-state snapshots and evaluation
pub mod network_state;
/// Peer records and protocol versions
pub mod peer;
/// Peer admission control
pub mod processor;
/// The peer registry
pub mod registry;
/// Collaborator capability traits
pub mod services;

pub use api::{ConsensusApi, CurrentRound, UnconfirmedTransactions};
pub use config::P2pConfig;
pub use error::{P2pError, P2pResult, PeerRejection};
pub use monitor::NetworkMonitor;
pub use network_state::{
    NetworkState, NetworkStateEvaluator, NetworkStateStatus, OverHeightHeader,
};
pub use peer::{ParseVersionError, Peer, ProtocolVersion};
pub use processor::{PeerCandidate, PeerProcessor};
pub use registry::{AddOutcome, PeerRegistry};
pub use services::{
    events, ChainStore, Clock, EventPublisher, PeerContact, PeerPong, SystemClock,
    TransactionPool,
};
