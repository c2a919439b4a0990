//! Ledger accessor used by every chaincode.
//!
//! The host runtime owns the world state; chaincodes only see a flat
//! string-keyed byte store with two synchronous operations. Commit
//! atomicity, ordering across concurrent transactions and conflict
//! detection all belong to the host.
//!
//! ## Absent keys
//!
//! `get_state` returns an empty byte vector for a key that was never
//! written. The store does not distinguish "absent" from "stored empty", and
//! neither do the chaincodes.
//!
//! ## Namespace isolation
//!
//! [`NamespacedLedger`] wraps a host ledger and rejects any key that does not
//! start with one of the configured prefixes. An empty prefix list means
//! unrestricted access.

use std::collections::BTreeMap;

use thiserror::Error;

/// A failure reported by the host ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger read of key '{key}' failed: {message}")]
    Read { key: String, message: String },

    #[error("ledger write of key '{key}' failed: {message}")]
    Write { key: String, message: String },

    #[error("KV namespace violation: {operation} key '{key}' outside allowed prefixes {allowed:?}")]
    Namespace {
        key: String,
        operation: &'static str,
        allowed: Vec<String>,
    },
}

impl LedgerError {
    /// The key the failed operation targeted.
    pub fn key(&self) -> &str {
        match self {
            LedgerError::Read { key, .. } | LedgerError::Write { key, .. } | LedgerError::Namespace { key, .. } => key,
        }
    }
}

/// Key-value access to the host ledger for the duration of one transaction.
pub trait Ledger {
    /// Read the value stored under `key`. Absent keys yield an empty vector.
    fn get_state(&self, key: &str) -> Result<Vec<u8>, LedgerError>;

    /// Write `value` under `key`, replacing any previous value.
    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError>;
}

/// In-memory ledger for tests and embedding.
///
/// Counts successful writes so callers can assert that a rejected
/// invocation left the store untouched.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    state: BTreeMap<String, Vec<u8>>,
    writes: usize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put_state` calls since creation.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Number of distinct keys currently stored.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Borrow the raw value under `key` without going through the trait.
    pub fn raw(&self, key: &str) -> Option<&[u8]> {
        self.state.get(key).map(Vec::as_slice)
    }
}

impl Ledger for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Vec<u8>, LedgerError> {
        Ok(self.state.get(key).cloned().unwrap_or_default())
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        self.state.insert(key.to_string(), value.to_vec());
        self.writes += 1;
        Ok(())
    }
}

/// Validate that a key is within the allowed namespace.
///
/// Returns `Ok(())` if the key starts with any allowed prefix or if no
/// prefixes are configured.
pub fn validate_key_prefix(allowed_prefixes: &[String], key: &str, operation: &'static str) -> Result<(), LedgerError> {
    if allowed_prefixes.is_empty() || allowed_prefixes.iter().any(|prefix| key.starts_with(prefix.as_str())) {
        return Ok(());
    }
    let err = LedgerError::Namespace {
        key: key.to_string(),
        operation,
        allowed: allowed_prefixes.to_vec(),
    };
    tracing::warn!("{}", err);
    Err(err)
}

/// A ledger view restricted to a set of key prefixes.
pub struct NamespacedLedger<'a> {
    inner: &'a mut dyn Ledger,
    allowed_prefixes: &'a [String],
}

impl<'a> NamespacedLedger<'a> {
    pub fn new(inner: &'a mut dyn Ledger, allowed_prefixes: &'a [String]) -> Self {
        Self {
            inner,
            allowed_prefixes,
        }
    }
}

impl Ledger for NamespacedLedger<'_> {
    fn get_state(&self, key: &str) -> Result<Vec<u8>, LedgerError> {
        validate_key_prefix(self.allowed_prefixes, key, "read")?;
        self.inner.get_state(key).inspect_err(|e| {
            tracing::warn!(key, error = %e, "ledger get_state failed");
        })
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        validate_key_prefix(self.allowed_prefixes, key, "write")?;
        self.inner.put_state(key, value).inspect_err(|e| {
            tracing::warn!(key, error = %e, "ledger put_state failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // MemoryLedger
    // -------------------------------------------------------------------------

    #[test]
    fn absent_key_reads_as_empty() {
        let ledger = MemoryLedger::new();
        assert!(ledger.get_state("missing").unwrap().is_empty());
    }

    #[test]
    fn put_then_get_returns_same_bytes() {
        let mut ledger = MemoryLedger::new();
        ledger.put_state("k", b"value").unwrap();
        assert_eq!(ledger.get_state("k").unwrap(), b"value");
        assert_eq!(ledger.write_count(), 1);
    }

    #[test]
    fn put_overwrites_previous_value() {
        let mut ledger = MemoryLedger::new();
        ledger.put_state("k", b"one").unwrap();
        ledger.put_state("k", b"two").unwrap();
        assert_eq!(ledger.raw("k"), Some(b"two".as_slice()));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.write_count(), 2);
    }

    // -------------------------------------------------------------------------
    // validate_key_prefix
    // -------------------------------------------------------------------------

    #[test]
    fn empty_prefixes_allow_all() {
        assert!(validate_key_prefix(&[], "anything:goes", "read").is_ok());
    }

    #[test]
    fn key_within_allowed_prefix_is_valid() {
        let prefixes = vec!["cb426:".to_string()];
        assert!(validate_key_prefix(&prefixes, "cb426:chains", "write").is_ok());
    }

    #[test]
    fn key_outside_allowed_prefix_is_rejected() {
        let prefixes = vec!["cb426:".to_string()];
        let err = validate_key_prefix(&prefixes, "chains", "write").unwrap_err();
        assert_eq!(err.key(), "chains");
        let msg = err.to_string();
        assert!(msg.contains("namespace violation"));
        assert!(msg.contains("write"), "error should mention the operation");
    }

    // -------------------------------------------------------------------------
    // NamespacedLedger
    // -------------------------------------------------------------------------

    #[test]
    fn namespaced_ledger_blocks_foreign_writes() {
        let mut inner = MemoryLedger::new();
        let prefixes = vec!["ubl:".to_string()];
        {
            let mut guarded = NamespacedLedger::new(&mut inner, &prefixes);
            assert!(guarded.put_state("ubl:msg-1", b"{}").is_ok());
            assert!(guarded.put_state("keystore:Org1MSP", b"{}").is_err());
            assert!(guarded.get_state("keystore:Org1MSP").is_err());
        }
        assert_eq!(inner.write_count(), 1);
        assert!(inner.raw("keystore:Org1MSP").is_none());
    }
}
