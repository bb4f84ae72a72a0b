//! Error types for the peer and network-state layer.

use arden_consensus::ContractViolation;
use thiserror::Error;

/// Result alias used across the crate.
pub type P2pResult<T> = std::result::Result<T, P2pError>;

/// Failures surfaced by the peer layer and its collaborators.
#[derive(Debug, Error)]
pub enum P2pError {
    /// The chain store could not serve a query.
    #[error("chain store error: {0}")]
    ChainStore(String),

    /// The transaction pool could not serve a query.
    #[error("transaction pool error: {0}")]
    TransactionPool(String),

    /// A peer could not be contacted.
    #[error("peer contact error: {0}")]
    PeerContact(String),

    /// A scheduling calculator was handed arguments outside its contract.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

/// Why a peer candidate was refused admission.
///
/// Rejections are ordinary outcomes of admission control, not faults; they
/// are kept apart from [`P2pError`] so callers can report them to the remote
/// side without wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerRejection {
    /// The advertised address could not be parsed or is unusable.
    #[error("peer address is malformed: {0}")]
    Malformed(String),

    /// The candidate advertises this node's own endpoint.
    #[error("peer is this node itself")]
    SelfConnection,

    /// The peer is still serving a ban.
    #[error("peer is banned until epoch millisecond {until_ms}")]
    Banned {
        /// When the ban lapses, in milliseconds since the Unix epoch.
        until_ms: u64,
    },

    /// The advertised protocol version is unusable or too old.
    #[error("peer protocol version {version} does not satisfy minimum {minimum}")]
    IncompatibleVersion {
        /// Version string the candidate advertised.
        version: String,
        /// Lowest version this node accepts.
        minimum: String,
    },

    /// The peer is already registered.
    #[error("peer is already registered")]
    Duplicate,
}
