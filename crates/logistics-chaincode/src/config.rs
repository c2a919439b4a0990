//! Deployment configuration for the chaincodes.
//!
//! Defaults reproduce the storage layout existing networks already hold, so
//! a deployment without configuration stays byte-compatible with them.

use serde::Deserialize;
use serde::Serialize;

pub mod constants {
    /// Well-known key under which all transport chains are stored as one array.
    pub const DEFAULT_CHAINS_KEY: &str = "chains";

    /// Reply returned by `addMessage` once the payload is stored.
    ///
    /// Clients compare against these exact bytes, spelling included.
    pub const DEFAULT_MESSAGE_SAVED_REPLY: &str = "Message succesfully saved";

    pub const KEYSTORE_CHAINCODE: &str = "keystore";
    pub const TRANSPORT_CHAIN_CHAINCODE: &str = "transportChain";
    pub const UBL_CHAINCODE: &str = "ubl";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChaincodeConfig {
    /// Key holding the JSON array of transport chains.
    pub chains_key: String,
    /// Allowed ledger key prefixes. Empty means unrestricted.
    pub allowed_key_prefixes: Vec<String>,
    /// Fixed success reply of `addMessage`.
    pub message_saved_reply: String,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            chains_key: constants::DEFAULT_CHAINS_KEY.to_string(),
            allowed_key_prefixes: Vec::new(),
            message_saved_reply: constants::DEFAULT_MESSAGE_SAVED_REPLY.to_string(),
        }
    }
}

impl ChaincodeConfig {
    /// Parse a configuration document. Missing fields take their defaults.
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| anyhow::anyhow!("invalid chaincode configuration: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no chaincode can operate under.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chains_key.is_empty() {
            anyhow::bail!("chainsKey must not be empty");
        }
        if !self.allowed_key_prefixes.is_empty()
            && !self.allowed_key_prefixes.iter().any(|p| self.chains_key.starts_with(p.as_str()))
        {
            anyhow::bail!(
                "chainsKey '{}' is outside the allowed key prefixes {:?}",
                self.chains_key,
                self.allowed_key_prefixes
            );
        }
        Ok(())
    }

    /// Set the key holding the transport chain array.
    pub fn with_chains_key(mut self, key: impl Into<String>) -> Self {
        self.chains_key = key.into();
        self
    }

    /// Set the allowed ledger key prefixes for namespace isolation.
    pub fn with_key_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.allowed_key_prefixes = prefixes;
        self
    }

    /// Set the reply returned after a shipment message is stored.
    pub fn with_message_saved_reply(mut self, reply: impl Into<String>) -> Self {
        self.message_saved_reply = reply.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_existing_layout() {
        let config = ChaincodeConfig::default();
        assert_eq!(config.chains_key, "chains");
        assert!(config.allowed_key_prefixes.is_empty());
        assert_eq!(config.message_saved_reply, "Message succesfully saved");
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = ChaincodeConfig::from_json(br#"{"allowedKeyPrefixes": ["", "x"]}"#).unwrap();
        assert_eq!(config.chains_key, "chains");
        assert_eq!(config.allowed_key_prefixes, vec!["".to_string(), "x".to_string()]);
    }

    #[test]
    fn from_json_rejects_malformed_document() {
        assert!(ChaincodeConfig::from_json(b"{chainsKey:").is_err());
    }

    #[test]
    fn empty_chains_key_is_rejected() {
        let err = ChaincodeConfig::default().with_chains_key("").validate().unwrap_err();
        assert!(err.to_string().contains("chainsKey"));
    }

    #[test]
    fn chains_key_must_sit_inside_namespace() {
        let config = ChaincodeConfig::default().with_key_prefixes(vec!["cb426:".to_string()]);
        assert!(config.validate().is_err());
        assert!(config.with_chains_key("cb426:chains").validate().is_ok());
    }
}
