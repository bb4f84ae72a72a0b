//! Active delegate entries.

use serde::{Deserialize, Serialize};

use crate::keys::PublicKey;

/// A delegate in the active forging schedule.
///
/// The consensus layer never interprets `attribute`; it carries whatever
/// wallet state (username, vote balance, produced block counters) the chain
/// store attached, and passes it through to round reports untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegate {
    /// Identity of the delegate.
    pub public_key: PublicKey,
    /// 1-based position by forging weight.
    pub rank: u32,
    /// Opaque wallet attributes supplied by the chain store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<serde_json::Value>,
}

impl Delegate {
    /// Creates a delegate entry with no extra attributes.
    pub fn new(public_key: PublicKey, rank: u32) -> Self {
        Self {
            public_key,
            rank,
            attribute: None,
        }
    }

    /// Attaches opaque wallet attributes.
    pub fn with_attribute(mut self, attribute: serde_json::Value) -> Self {
        self.attribute = Some(attribute);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn key(prefix: u8) -> PublicKey {
        PublicKey::new(format!("{:02x}{}", prefix, "11".repeat(32))).unwrap()
    }

    #[test]
    fn test_attribute_survives_round_trip() {
        let delegate = Delegate::new(key(2), 1).with_attribute(json!({
            "username": "genesis_1",
            "voteBalance": "245098000000000",
        }));
        let json = serde_json::to_value(&delegate).unwrap();
        assert_eq!(json["attribute"]["username"], "genesis_1");
        let back: Delegate = serde_json::from_value(json).unwrap();
        assert_eq!(back, delegate);
    }

    #[test]
    fn test_absent_attribute_is_omitted() {
        let delegate = Delegate::new(key(3), 7);
        let json = serde_json::to_value(&delegate).unwrap();
        assert!(json.get("attribute").is_none());
        assert_eq!(json["publicKey"], key(3).as_str());
        assert_eq!(json["rank"], 7);
    }
}
