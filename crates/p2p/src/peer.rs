//! Peer records and protocol versions.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The version string does not follow `MAJOR.MINOR.PATCH`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("protocol version must look like MAJOR.MINOR.PATCH, got {0:?}")]
pub struct ParseVersionError(pub String);

/// A peer protocol version, ordered lexicographically by component.
///
/// A pre-release tag on the patch component (`2.6.0-next.9`) is accepted and
/// ignored for ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ProtocolVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl ProtocolVersion {
    /// Builds a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether this version satisfies `minimum`.
    pub fn satisfies(&self, minimum: &ProtocolVersion) -> bool {
        self >= minimum
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ProtocolVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError(s.to_string());
        // splitn keeps dots inside the pre-release tag with the patch component
        let mut parts = s.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(major), Some(minor), Some(patch)) => {
                let patch = patch.split_once('-').map_or(patch, |(head, _)| head);
                Ok(Self {
                    major: major.parse().map_err(|_| invalid())?,
                    minor: minor.parse().map_err(|_| invalid())?,
                    patch: patch.parse().map_err(|_| invalid())?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for ProtocolVersion {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProtocolVersion> for String {
    fn from(version: ProtocolVersion) -> Self {
        version.to_string()
    }
}

/// A registered peer and everything the health layer knows about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    /// Advertised address.
    pub address: IpAddr,
    /// Advertised port.
    pub port: u16,
    /// Protocol version the peer announced at admission.
    pub version: ProtocolVersion,
    /// Chain height from the most recent contact.
    pub height: u64,
    /// Round-trip time of the most recent contact, if any succeeded yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Milliseconds since the Unix epoch of the last successful contact.
    pub last_seen_ms: u64,
    /// Milliseconds since the Unix epoch until which the peer is banned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_until_ms: Option<u64>,
    /// Block header the peer announced last, kept verbatim as fork evidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_block_header: Option<serde_json::Value>,
}

impl Peer {
    /// Creates a freshly admitted peer record.
    pub fn new(address: IpAddr, port: u16, version: ProtocolVersion, height: u64) -> Self {
        Self {
            address,
            port,
            version,
            height,
            latency_ms: None,
            last_seen_ms: unix_time_ms(),
            banned_until_ms: None,
            last_block_header: None,
        }
    }

    /// The registry key for this peer.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Folds a successful contact into the record.
    pub fn record_contact(
        &mut self,
        height: u64,
        latency_ms: u64,
        header: Option<serde_json::Value>,
    ) {
        self.height = height;
        self.latency_ms = Some(latency_ms);
        self.last_block_header = header;
        self.last_seen_ms = unix_time_ms();
    }

    /// Whether a ban is still in force at `now_ms`.
    pub fn is_banned(&self, now_ms: u64) -> bool {
        self.banned_until_ms.is_some_and(|until| until > now_ms)
    }

    /// Whether a past ban has lapsed by `now_ms`.
    pub fn ban_lapsed(&self, now_ms: u64) -> bool {
        self.banned_until_ms.is_some_and(|until| until <= now_ms)
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
