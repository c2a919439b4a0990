//! Multi-party transport chains.
//!
//! All chains live together as one JSON array under a single well-known key
//! (`chains` by default). The store has no range queries, so every update
//! reads the whole array, upserts one record by identifier and writes the
//! whole array back.
//!
//! [`ChainBook`] keeps the array order and an identifier index side by side.
//! At most one record per identifier exists after any upsert. If previously
//! stored data already holds duplicates, the first occurrence is the one
//! that is read and replaced; later duplicates are carried along untouched.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::config::ChaincodeConfig;
use crate::config::constants::TRANSPORT_CHAIN_CHAINCODE;
use crate::error::ChaincodeError;
use crate::error::ChaincodeResult;
use crate::handler::Chaincode;
use crate::handler::expect_args;
use crate::handler::unknown_function;
use crate::ledger::Ledger;

pub const SET_TRANSPORT_CHAIN: &str = "setTransportChain";
pub const GET_TRANSPORT_CHAIN: &str = "getTransportChain";

/// A named, ordered route of participant identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub participants: Vec<String>,
}

impl Chain {
    /// Build a chain from a comma-separated participant list.
    ///
    /// No trimming and no filtering of empty entries: `""` yields one empty
    /// participant and `"a,,b"` yields three.
    pub fn from_csv(id: impl Into<String>, participants: &str) -> Self {
        Self {
            id: id.into(),
            participants: participants.split(',').map(str::to_string).collect(),
        }
    }

    fn to_json(&self) -> ChaincodeResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ChaincodeError::Encode(e.to_string()))
    }
}

/// The decoded chains array with an identifier index.
#[derive(Debug, Default, Clone)]
pub struct ChainBook {
    chains: Vec<Chain>,
    index: HashMap<String, usize>,
}

impl ChainBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the stored chains blob.
    ///
    /// An empty blob or JSON `null` means no chains have been stored yet.
    pub fn from_state(key: &str, bytes: &[u8]) -> ChaincodeResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::new());
        }
        let chains: Option<Vec<Chain>> = serde_json::from_slice(bytes).map_err(|e| ChaincodeError::CorruptState {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_chains(chains.unwrap_or_default()))
    }

    pub fn from_chains(chains: Vec<Chain>) -> Self {
        let mut index = HashMap::with_capacity(chains.len());
        for (position, chain) in chains.iter().enumerate() {
            index.entry(chain.id.clone()).or_insert(position);
        }
        Self { chains, index }
    }

    pub fn get(&self, id: &str) -> Option<&Chain> {
        self.index.get(id).map(|&position| &self.chains[position])
    }

    /// Replace the chain with the same identifier in place, or append it.
    ///
    /// Returns `true` if an existing chain was replaced.
    pub fn upsert(&mut self, chain: Chain) -> bool {
        match self.index.get(&chain.id) {
            Some(&position) => {
                self.chains[position] = chain;
                true
            }
            None => {
                self.index.insert(chain.id.clone(), self.chains.len());
                self.chains.push(chain);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Encode the full array in stored order.
    pub fn to_json(&self) -> ChaincodeResult<Vec<u8>> {
        serde_json::to_vec(&self.chains).map_err(|e| ChaincodeError::Encode(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct TransportChainChaincode {
    chains_key: String,
}

impl Default for TransportChainChaincode {
    fn default() -> Self {
        Self::new(&ChaincodeConfig::default())
    }
}

impl TransportChainChaincode {
    pub fn new(config: &ChaincodeConfig) -> Self {
        Self {
            chains_key: config.chains_key.clone(),
        }
    }

    /// Key the chains array is stored under.
    pub fn chains_key(&self) -> &str {
        &self.chains_key
    }

    fn load(&self, ledger: &dyn Ledger) -> ChaincodeResult<ChainBook> {
        let bytes = ledger.get_state(&self.chains_key)?;
        ChainBook::from_state(&self.chains_key, &bytes)
    }

    /// Create or fully replace the chain with the given identifier.
    ///
    /// Returns the JSON of the single new or updated chain.
    pub fn set_transport_chain(&self, ledger: &mut dyn Ledger, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let [id, participants] = expect_args::<2>(args)?;

        let mut book = self.load(ledger)?;
        let chain = Chain::from_csv(id.as_str(), participants);
        let reply = chain.to_json()?;
        let replaced = book.upsert(chain);
        ledger.put_state(&self.chains_key, &book.to_json()?)?;

        tracing::debug!(
            chaincode = TRANSPORT_CHAIN_CHAINCODE,
            chain_id = id.as_str(),
            replaced,
            chain_count = book.len(),
            "transport chain stored"
        );
        Ok(reply)
    }

    /// Look up a chain by identifier.
    ///
    /// An empty identifier returns the raw stored array. An unknown
    /// identifier returns an empty payload.
    pub fn get_transport_chain(&self, ledger: &mut dyn Ledger, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let [id] = expect_args::<1>(args)?;

        if id.is_empty() {
            return ledger.get_state(&self.chains_key).map_err(|e| ChaincodeError::from_read(&self.chains_key, e));
        }

        match self.load(ledger)?.get(id) {
            Some(chain) => chain.to_json(),
            None => Ok(Vec::new()),
        }
    }
}

impl Chaincode for TransportChainChaincode {
    fn name(&self) -> &'static str {
        TRANSPORT_CHAIN_CHAINCODE
    }

    fn functions(&self) -> &'static [&'static str] {
        &[SET_TRANSPORT_CHAIN, GET_TRANSPORT_CHAIN]
    }

    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        match function {
            SET_TRANSPORT_CHAIN => self.set_transport_chain(ledger, args),
            GET_TRANSPORT_CHAIN => self.get_transport_chain(ledger, args),
            other => Err(unknown_function(TRANSPORT_CHAIN_CHAINCODE, other)),
        }
    }
}
