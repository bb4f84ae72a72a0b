//! # Arden Core
//!
//! Shared primitives for the Arden node.
//!
//! This crate holds the small set of types every other crate agrees on:
//! delegate identities, active-schedule entries and the block summary the
//! scheduling layer consumes. It deliberately carries no I/O and no async
//! surface so it can sit at the bottom of the dependency graph.

#![warn(missing_docs)]

/// Block summaries consumed by scheduling and round reports
pub mod block;
/// Active delegate entries
pub mod delegate;
/// Delegate identity keys
pub mod keys;

pub use block::BlockSummary;
pub use delegate::Delegate;
pub use keys::{KeyError, PublicKey, PUBLIC_KEY_HEX_LEN};
