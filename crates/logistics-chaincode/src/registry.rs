//! Chaincode registry for routing host calls by deployed name.
//!
//! The host resolves which chaincode a transaction targets; the registry maps
//! that name to the chaincode and applies the configured key namespace to
//! the ledger before delegating.
//!
//! ## Lifecycle
//!
//! 1. **Init** – called once per chaincode at instantiation, always succeeds
//! 2. **Invoke** – called per transaction, runs to completion synchronously

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::config::ChaincodeConfig;
use crate::contracts::KeystoreChaincode;
use crate::contracts::TransportChainChaincode;
use crate::contracts::UblChaincode;
use crate::error::ChaincodeError;
use crate::error::ChaincodeResult;
use crate::handler::Chaincode;
use crate::ledger::Ledger;
use crate::ledger::NamespacedLedger;
use crate::marshal::Invocation;
use crate::marshal::Response;

pub struct ChaincodeRegistry {
    config: ChaincodeConfig,
    chaincodes: BTreeMap<&'static str, Arc<dyn Chaincode>>,
}

impl ChaincodeRegistry {
    /// Create an empty registry.
    pub fn new(config: ChaincodeConfig) -> Self {
        Self {
            config,
            chaincodes: BTreeMap::new(),
        }
    }

    /// Create a registry with the keystore, transport chain and UBL chaincodes.
    pub fn with_defaults(config: ChaincodeConfig) -> Self {
        let mut registry = Self::new(config);
        registry.register(Arc::new(KeystoreChaincode::new()));
        registry.register(Arc::new(TransportChainChaincode::new(&registry.config)));
        registry.register(Arc::new(UblChaincode::new(&registry.config)));
        registry
    }

    /// Register a chaincode under its name, replacing any previous one.
    pub fn register(&mut self, chaincode: Arc<dyn Chaincode>) {
        let name = chaincode.name();
        if self.chaincodes.insert(name, chaincode).is_some() {
            info!(chaincode = name, "replaced registered chaincode");
        } else {
            debug!(chaincode = name, "registered chaincode");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Chaincode>> {
        self.chaincodes.get(name).cloned()
    }

    /// Names of all registered chaincodes, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.chaincodes.keys().copied().collect()
    }

    pub fn config(&self) -> &ChaincodeConfig {
        &self.config
    }

    fn resolve(&self, name: &str) -> ChaincodeResult<&Arc<dyn Chaincode>> {
        self.chaincodes.get(name).ok_or_else(|| ChaincodeError::UnknownChaincode {
            name: name.to_string(),
        })
    }

    /// Instantiate a chaincode.
    pub fn init(&self, name: &str, ledger: &mut dyn Ledger, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let chaincode = self.resolve(name)?;
        let mut guarded = NamespacedLedger::new(ledger, &self.config.allowed_key_prefixes);
        chaincode.init(&mut guarded, args)
    }

    /// Route one transaction to a chaincode function.
    pub fn invoke(
        &self,
        name: &str,
        ledger: &mut dyn Ledger,
        function: &str,
        args: &[String],
    ) -> ChaincodeResult<Vec<u8>> {
        let chaincode = self.resolve(name)?;
        debug!(chaincode = name, function, arg_count = args.len(), "invoking chaincode");

        let mut guarded = NamespacedLedger::new(ledger, &self.config.allowed_key_prefixes);
        let result = chaincode.invoke(&mut guarded, function, args);
        if let Err(ref e) = result {
            debug!(chaincode = name, function, error = %e, "chaincode invocation failed");
        }
        result
    }

    /// Route a host envelope and wrap the outcome as a peer response.
    pub fn invoke_envelope(&self, name: &str, ledger: &mut dyn Ledger, invocation: &Invocation) -> Response {
        let (function, params) = invocation.function_and_parameters();
        Response::from(self.invoke(name, ledger, function, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::KEYSTORE_CHAINCODE;
    use crate::config::constants::TRANSPORT_CHAIN_CHAINCODE;
    use crate::config::constants::UBL_CHAINCODE;
    use crate::ledger::MemoryLedger;
    use crate::marshal::ERROR;
    use crate::marshal::OK;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn defaults_register_three_chaincodes() {
        let registry = ChaincodeRegistry::with_defaults(ChaincodeConfig::default());
        assert_eq!(registry.names(), vec![KEYSTORE_CHAINCODE, TRANSPORT_CHAIN_CHAINCODE, UBL_CHAINCODE]);
        assert!(registry.get(UBL_CHAINCODE).unwrap().can_handle("addMessage"));
        assert!(!registry.get(UBL_CHAINCODE).unwrap().can_handle("addOrganisation"));
    }

    #[test]
    fn init_is_a_no_op() {
        let registry = ChaincodeRegistry::with_defaults(ChaincodeConfig::default());
        let mut ledger = MemoryLedger::new();
        for name in registry.names() {
            assert!(registry.init(name, &mut ledger, &args(&["ignored"])).unwrap().is_empty());
        }
        assert_eq!(ledger.write_count(), 0);
    }

    #[test]
    fn unknown_chaincode_is_rejected() {
        let registry = ChaincodeRegistry::with_defaults(ChaincodeConfig::default());
        let mut ledger = MemoryLedger::new();
        let err = registry.invoke("marbles", &mut ledger, "init", &[]).unwrap_err();
        assert!(matches!(err, ChaincodeError::UnknownChaincode { ref name } if name == "marbles"));
    }

    #[test]
    fn key_namespace_is_enforced() {
        let config = ChaincodeConfig::default()
            .with_key_prefixes(vec!["cb426:".to_string()])
            .with_chains_key("cb426:chains");
        let registry = ChaincodeRegistry::with_defaults(config);
        assert_eq!(registry.config().allowed_key_prefixes, ["cb426:"]);
        assert!(registry.config().validate().is_ok());
        let mut ledger = MemoryLedger::new();

        let err = registry.invoke(KEYSTORE_CHAINCODE, &mut ledger, "addOrganisation", &args(&["Org1MSP", "pk"]));
        assert!(err.is_err());
        registry.invoke(KEYSTORE_CHAINCODE, &mut ledger, "addOrganisation", &args(&["cb426:Org1MSP", "pk"])).unwrap();
        registry.invoke(TRANSPORT_CHAIN_CHAINCODE, &mut ledger, "setTransportChain", &args(&["A", "x"])).unwrap();

        assert_eq!(ledger.write_count(), 2);
        assert!(ledger.raw("cb426:chains").is_some());
    }

    #[test]
    fn envelope_invocation_produces_peer_response() {
        let registry = ChaincodeRegistry::with_defaults(ChaincodeConfig::default());
        let mut ledger = MemoryLedger::new();

        let ok = registry.invoke_envelope(
            TRANSPORT_CHAIN_CHAINCODE,
            &mut ledger,
            &Invocation::new("setTransportChain", ["A", "p1,p2"]),
        );
        assert_eq!(ok.status, OK);
        assert_eq!(ok.payload, br#"{"id":"A","participants":["p1","p2"]}"#);

        let failed = registry.invoke_envelope(TRANSPORT_CHAIN_CHAINCODE, &mut ledger, &Invocation::default());
        assert_eq!(failed.status, ERROR);
        assert_eq!(failed.message, "Invalid Smart Contract function name:");
    }
}
