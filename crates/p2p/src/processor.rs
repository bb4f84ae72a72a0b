//! Peer admission control.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::P2pConfig;
use crate::error::PeerRejection;
use crate::peer::{unix_time_ms, Peer, ProtocolVersion};
use crate::registry::{AddOutcome, PeerRegistry};
use crate::services::{events, EventPublisher};

/// An unvalidated peer announcement as it arrives off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerCandidate {
    /// Advertised address, not yet parsed.
    pub address: String,
    /// Advertised port.
    pub port: u16,
    /// Advertised protocol version, not yet parsed.
    pub version: String,
    /// Claimed chain height.
    pub height: u64,
}

/// Validates candidates and admits the acceptable ones into the registry.
///
/// Checks run in a fixed order and the first failure wins: address shape,
/// self-connection, ban, version. A rejected candidate leaves the registry
/// untouched.
pub struct PeerProcessor {
    registry: Arc<PeerRegistry>,
    publisher: Arc<dyn EventPublisher>,
    advertised: SocketAddr,
    min_version: ProtocolVersion,
}

impl PeerProcessor {
    /// Creates admission control over `registry`, announcing admissions
    /// through `publisher`.
    pub fn new(
        registry: Arc<PeerRegistry>,
        publisher: Arc<dyn EventPublisher>,
        config: &P2pConfig,
    ) -> Self {
        Self {
            registry,
            publisher,
            advertised: config.advertised_socket(),
            min_version: config.min_version,
        }
    }

    /// Runs the admission checks and, on success, registers the peer.
    pub async fn validate_and_accept(
        &self,
        candidate: PeerCandidate,
    ) -> Result<Peer, PeerRejection> {
        let peer = self.validate(candidate).await?;

        match self.registry.add(peer.clone()).await {
            AddOutcome::Duplicate => Err(PeerRejection::Duplicate),
            AddOutcome::Evicted { removed } => {
                dispatch_peer_event(self.publisher.as_ref(), events::PEER_REMOVED, &removed);
                self.announce(&peer);
                Ok(peer)
            }
            AddOutcome::Added | AddOutcome::Replaced => {
                self.announce(&peer);
                Ok(peer)
            }
        }
    }

    async fn validate(&self, candidate: PeerCandidate) -> Result<Peer, PeerRejection> {
        let address: IpAddr = candidate.address.trim().parse().map_err(|_| {
            PeerRejection::Malformed(format!("unparseable address {:?}", candidate.address))
        })?;
        if address.is_unspecified() {
            return Err(PeerRejection::Malformed("unspecified address".to_string()));
        }

        let socket = SocketAddr::new(address, candidate.port);
        if socket == self.advertised {
            return Err(PeerRejection::SelfConnection);
        }

        if let Some(existing) = self.registry.get(&socket).await {
            if let Some(until_ms) = existing.banned_until_ms {
                if until_ms > unix_time_ms() {
                    debug!(peer_addr = %socket, until_ms, "rejecting banned peer");
                    return Err(PeerRejection::Banned { until_ms });
                }
            }
        }

        let incompatible = || PeerRejection::IncompatibleVersion {
            version: candidate.version.clone(),
            minimum: self.min_version.to_string(),
        };
        let version: ProtocolVersion = candidate.version.parse().map_err(|_| incompatible())?;
        if !version.satisfies(&self.min_version) {
            return Err(incompatible());
        }

        Ok(Peer::new(address, candidate.port, version, candidate.height))
    }

    fn announce(&self, peer: &Peer) {
        debug!(peer_addr = %peer.socket_addr(), height = peer.height, "peer accepted");
        dispatch_peer_event(self.publisher.as_ref(), events::PEER_ADDED, peer);
    }
}

pub(crate) fn dispatch_peer_event(publisher: &dyn EventPublisher, event: &str, peer: &Peer) {
    match serde_json::to_value(peer) {
        Ok(payload) => publisher.dispatch(event, payload),
        Err(err) => warn!(peer_addr = %peer.socket_addr(), %err, "peer event payload dropped"),
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl RecordingPublisher {
        fn names(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
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

    fn config() -> P2pConfig {
        P2pConfig {
            advertised_address: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            advertised_port: 4710,
            min_version: ProtocolVersion::new(2, 0, 0),
            ..P2pConfig::default()
        }
    }

    fn setup(config: &P2pConfig) -> (Arc<PeerRegistry>, Arc<RecordingPublisher>, PeerProcessor) {
        let registry = Arc::new(PeerRegistry::new(config));
        let publisher = Arc::new(RecordingPublisher::default());
        let processor = PeerProcessor::new(registry.clone(), publisher.clone(), config);
        (registry, publisher, processor)
    }

    fn candidate(address: &str) -> PeerCandidate {
        PeerCandidate {
            address: address.to_string(),
            port: 4710,
            version: "2.6.0".to_string(),
            height: 100,
        }
    }

    #[tokio::test]
    async fn test_valid_candidate_is_admitted_and_announced() {
        let config = config();
        let (registry, publisher, processor) = setup(&config);

        let peer = processor
            .validate_and_accept(candidate("10.1.1.1"))
            .await
            .unwrap();

        assert_eq!(peer.height, 100);
        assert_eq!(peer.version, ProtocolVersion::new(2, 6, 0));
        assert_eq!(registry.count().await, 1);
        assert_eq!(publisher.names(), vec![events::PEER_ADDED.to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_address_leaves_registry_untouched() {
        let config = config();
        let (registry, publisher, processor) = setup(&config);

        let result = processor
            .validate_and_accept(candidate("not-an-address"))
            .await;

        assert!(matches!(result, Err(PeerRejection::Malformed(_))));
        assert_eq!(registry.count().await, 0);
        assert!(publisher.names().is_empty());
    }

    #[tokio::test]
    async fn test_unspecified_address_is_malformed() {
        let config = config();
        let (_, _, processor) = setup(&config);

        let result = processor.validate_and_accept(candidate("0.0.0.0")).await;
        assert!(matches!(result, Err(PeerRejection::Malformed(_))));
    }

    #[tokio::test]
    async fn test_own_endpoint_is_rejected_as_self() {
        let config = config();
        let (registry, _, processor) = setup(&config);

        let result = processor.validate_and_accept(candidate("192.0.2.1")).await;

        assert_eq!(result, Err(PeerRejection::SelfConnection));
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_banned_peer_is_rejected_until_lapse() {
        let config = config();
        let (registry, _, processor) = setup(&config);

        let peer = processor
            .validate_and_accept(candidate("10.1.1.1"))
            .await
            .unwrap();
        let until_ms = unix_time_ms() + 60_000;
        registry.ban(&peer.socket_addr(), until_ms).await;

        let result = processor.validate_and_accept(candidate("10.1.1.1")).await;
        assert_eq!(result, Err(PeerRejection::Banned { until_ms }));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_lapsed_ban_readmits_the_peer() {
        let config = config();
        let (registry, _, processor) = setup(&config);

        let peer = processor
            .validate_and_accept(candidate("10.1.1.1"))
            .await
            .unwrap();
        registry.ban(&peer.socket_addr(), 1).await;

        let readmitted = processor.validate_and_accept(candidate("10.1.1.1")).await;
        assert!(readmitted.is_ok());
        let stored = registry.get(&peer.socket_addr()).await.unwrap();
        assert_eq!(stored.banned_until_ms, None);
    }

    #[tokio::test]
    async fn test_old_version_is_rejected() {
        let config = config();
        let (registry, _, processor) = setup(&config);

        let mut old = candidate("10.1.1.1");
        old.version = "1.9.9".to_string();

        let result = processor.validate_and_accept(old).await;
        assert_eq!(
            result,
            Err(PeerRejection::IncompatibleVersion {
                version: "1.9.9".to_string(),
                minimum: "2.0.0".to_string(),
            })
        );
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_unparseable_version_is_rejected_as_incompatible() {
        let config = config();
        let (_, _, processor) = setup(&config);

        let mut garbled = candidate("10.1.1.1");
        garbled.version = "latest".to_string();

        let result = processor.validate_and_accept(garbled).await;
        assert!(matches!(
            result,
            Err(PeerRejection::IncompatibleVersion { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_admission_is_rejected() {
        let config = config();
        let (registry, publisher, processor) = setup(&config);

        processor
            .validate_and_accept(candidate("10.1.1.1"))
            .await
            .unwrap();
        let result = processor.validate_and_accept(candidate("10.1.1.1")).await;

        assert_eq!(result, Err(PeerRejection::Duplicate));
        assert_eq!(registry.count().await, 1);
        assert_eq!(publisher.names(), vec![events::PEER_ADDED.to_string()]);
    }

    #[tokio::test]
    async fn test_eviction_announces_the_removed_peer() {
        let config = P2pConfig {
            max_peers: 1,
            min_peer_floor: 0,
            ..config()
        };
        let (registry, publisher, processor) = setup(&config);

        processor
            .validate_and_accept(candidate("10.1.1.1"))
            .await
            .unwrap();
        processor
            .validate_and_accept(candidate("10.1.1.2"))
            .await
            .unwrap();

        assert_eq!(registry.count().await, 1);
        assert_eq!(
            publisher.names(),
            vec![
                events::PEER_ADDED.to_string(),
                events::PEER_REMOVED.to_string(),
                events::PEER_ADDED.to_string(),
            ]
        );
    }
}
