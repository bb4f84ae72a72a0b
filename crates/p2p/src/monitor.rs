//! The background network monitor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::P2pConfig;
use crate::error::{P2pError, P2pResult};
use crate::network_state::{NetworkState, NetworkStateEvaluator, NetworkStateStatus};
use crate::peer::{unix_time_ms, Peer};
use crate::processor::dispatch_peer_event;
use crate::registry::PeerRegistry;
use crate::services::{events, ChainStore, EventPublisher, PeerContact, PeerPong};

/// Keeps the cached [`NetworkState`] fresh.
///
/// A spawned task contacts every registered peer each refresh interval,
/// folds the answers back into the registry, drops peers that stayed
/// silent, and re-evaluates. Readers only ever touch the cache; no caller
/// pays for a refresh. `force_wakeup` squeezes one extra cycle in between
/// ticks, and calls landing while a cycle is in flight coalesce into a
/// single queued run.
pub struct NetworkMonitor {
    registry: Arc<PeerRegistry>,
    evaluator: NetworkStateEvaluator,
    contact: Arc<dyn PeerContact>,
    chain: Arc<dyn ChainStore>,
    publisher: Arc<dyn EventPublisher>,
    state: RwLock<NetworkState>,
    wakeup: Notify,
    ever_reached_quorum: AtomicBool,
    running: AtomicBool,
    task: StdMutex<Option<JoinHandle<()>>>,
    refresh_interval: Duration,
    contact_timeout: Duration,
    min_quorum: f64,
}

impl NetworkMonitor {
    /// Creates a stopped monitor.
    ///
    /// The cache starts as the evaluation of an empty sample, so
    /// [`network_state`](Self::network_state) answers before the first
    /// cycle has run.
    pub fn new(
        registry: Arc<PeerRegistry>,
        contact: Arc<dyn PeerContact>,
        chain: Arc<dyn ChainStore>,
        publisher: Arc<dyn EventPublisher>,
        config: &P2pConfig,
    ) -> Self {
        let evaluator = NetworkStateEvaluator::new(config);
        let initial = evaluator.evaluate(&[], 0, false);

        Self {
            registry,
            evaluator,
            contact,
            chain,
            publisher,
            state: RwLock::new(initial),
            wakeup: Notify::new(),
            ever_reached_quorum: AtomicBool::new(false),
            running: AtomicBool::new(false),
            task: StdMutex::new(None),
            refresh_interval: Duration::from_millis(config.refresh_interval_ms),
            contact_timeout: Duration::from_millis(config.contact_timeout_ms),
            min_quorum: config.min_quorum,
        }
    }

    /// Spawns the refresh task. The first cycle runs immediately.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("network monitor already running");
            return;
        }

        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            info!(
                interval_ms = monitor.refresh_interval.as_millis() as u64,
                "network monitor started"
            );
            let mut ticker = tokio::time::interval(monitor.refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while monitor.running.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = monitor.wakeup.notified() => {
                        debug!("refresh cycle forced");
                    }
                }
                if !monitor.running.load(Ordering::SeqCst) {
                    break;
                }
                monitor.run_cycle().await;
            }
        });

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(handle);
        }
    }

    /// Stops the refresh task. The cached state stays readable.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.wakeup.notify_one();
        if let Ok(mut slot) = self.task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
        info!("network monitor stopped");
    }

    /// Whether the refresh task is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The most recent verdict. Never blocks on a refresh.
    pub async fn network_state(&self) -> NetworkState {
        self.state.read().await.clone()
    }

    /// Requests one extra refresh cycle as soon as possible.
    ///
    /// Returns immediately. Any number of calls while a cycle is in
    /// flight queue exactly one follow-up cycle.
    pub fn force_wakeup(&self) {
        self.wakeup.notify_one();
    }

    async fn run_cycle(&self) {
        let local_height = match self.chain.get_last_block().await {
            Ok(block) => block.height,
            Err(err) => {
                warn!(%err, "refresh cycle skipped, chain store unavailable");
                return;
            }
        };

        // Banned peers keep their record (and their ban) but are neither
        // contacted nor counted.
        let now_ms = unix_time_ms();
        let contactable: Vec<Peer> = self
            .registry
            .list()
            .await
            .into_iter()
            .filter(|peer| !peer.is_banned(now_ms))
            .collect();

        let outcomes = join_all(contactable.iter().map(|peer| self.contact_peer(peer))).await;
        for (peer, outcome) in contactable.iter().zip(outcomes) {
            let addr = peer.socket_addr();
            match outcome {
                Ok((pong, latency_ms)) => {
                    self.registry
                        .record_contact(&addr, pong.height, latency_ms, pong.header)
                        .await;
                }
                Err(err) => {
                    debug!(peer_addr = %addr, %err, "dropping unresponsive peer");
                    if let Some(removed) = self.registry.remove(&addr).await {
                        dispatch_peer_event(
                            self.publisher.as_ref(),
                            events::PEER_REMOVED,
                            &removed,
                        );
                    }
                }
            }
        }

        let now_ms = unix_time_ms();
        let sample: Vec<Peer> = self
            .registry
            .list()
            .await
            .into_iter()
            .filter(|peer| !peer.is_banned(now_ms))
            .collect();
        let ever = self.ever_reached_quorum.load(Ordering::SeqCst);
        let state = self.evaluator.evaluate(&sample, local_height, ever);

        if state.status == NetworkStateStatus::Default && state.quorum >= self.min_quorum {
            self.ever_reached_quorum.store(true, Ordering::SeqCst);
        }

        let mut cached = self.state.write().await;
        if cached.status == state.status {
            debug!(
                status = %state.status,
                quorum = state.quorum,
                sample = state.sample_size,
                height = local_height,
                "network state refreshed"
            );
        } else {
            info!(
                status = %state.status,
                previous = %cached.status,
                quorum = state.quorum,
                sample = state.sample_size,
                height = local_height,
                "network state changed"
            );
        }
        *cached = state;
    }

    async fn contact_peer(&self, peer: &Peer) -> P2pResult<(PeerPong, u64)> {
        let started = Instant::now();
        match tokio::time::timeout(
            self.contact_timeout,
            self.contact.ping(peer.address, peer.port),
        )
        .await
        {
            Ok(Ok(pong)) => Ok((pong, started.elapsed().as_millis() as u64)),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(P2pError::PeerContact(format!(
                "no response within {}ms",
                self.contact_timeout.as_millis()
            ))),
        }
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
