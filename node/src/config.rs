//! Node configuration management.
//!
//! The node reads a single TOML file with `[node]`, `[p2p]` and `[slots]`
//! sections plus a top-level `delegates` list. Every key is optional; the
//! defaults describe a node that still needs a delegate schedule before it
//! will start.

use std::path::Path;

use anyhow::Context;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use arden_consensus::SlotConfig;
use arden_core::PublicKey;
use arden_p2p::P2pConfig;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node identification
    pub node: NodeInfo,
    /// Peer-health and admission settings
    pub p2p: P2pConfig,
    /// Forging-slot timing
    pub slots: SlotConfig,
    /// Delegate public keys for the dev chain, in forging order
    pub delegates: Vec<String>,
}

/// Node identification information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    /// Display name used in logs
    pub name: String,
    /// Chain epoch as RFC 3339; chain time counts seconds from here
    pub epoch: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeInfo::default(),
            p2p: P2pConfig::default(),
            slots: SlotConfig::default(),
            delegates: Vec::new(),
        }
    }
}

impl Default for NodeInfo {
    fn default() -> Self {
        Self {
            name: "arden-node".to_string(),
            epoch: "2024-01-01T00:00:00Z".to_string(),
        }
    }
}

impl NodeConfig {
    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: NodeConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Configuration for a self-contained development run: two deterministic
    /// delegate keys and otherwise default settings.
    pub fn dev() -> Self {
        let mut config = Self::default();
        config.delegates = (1..=2u8)
            .map(|i| format!("02{}", format!("{i:02x}").repeat(32)))
            .collect();
        config
    }

    /// The configured delegate keys, parsed and in forging order.
    pub fn delegate_keys(&self) -> anyhow::Result<Vec<PublicKey>> {
        self.delegates
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                PublicKey::new(raw.clone())
                    .with_context(|| format!("delegate {index} has an invalid public key"))
            })
            .collect()
    }

    /// Unix timestamp of the configured chain epoch.
    pub fn epoch_unix_secs(&self) -> anyhow::Result<u64> {
        let parsed = DateTime::parse_from_rfc3339(&self.node.epoch)
            .with_context(|| format!("invalid epoch timestamp {:?}", self.node.epoch))?;
        let secs = parsed.timestamp();
        if secs < 0 {
            anyhow::bail!("epoch {:?} predates the unix epoch", self.node.epoch);
        }
        Ok(secs as u64)
    }

    /// Validates configuration before the node starts.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.p2p.max_peers == 0 {
            anyhow::bail!("max_peers must be greater than 0");
        }
        if self.p2p.refresh_interval_ms == 0 {
            anyhow::bail!("refresh_interval_ms must be greater than 0");
        }
        if self.delegates.is_empty() {
            anyhow::bail!("at least one delegate public key must be configured");
        }
        self.delegate_keys()?;
        self.epoch_unix_secs()?;
        self.slots.validate()?;
        Ok(())
    }
}
