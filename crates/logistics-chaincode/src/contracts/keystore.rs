//! Organisation public key registry.
//!
//! Each organisation's public key is stored as a JSON record under its
//! membership service provider identifier. Records are created or silently
//! overwritten by `addOrganisation` and never deleted.

use serde::Deserialize;
use serde::Serialize;

use crate::config::constants::KEYSTORE_CHAINCODE;
use crate::error::ChaincodeError;
use crate::error::ChaincodeResult;
use crate::handler::Chaincode;
use crate::handler::expect_args;
use crate::handler::unknown_function;
use crate::ledger::Ledger;

pub const ADD_ORGANISATION: &str = "addOrganisation";
pub const GET_ORGANISATION: &str = "getOrganisation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    #[serde(rename = "mspID")]
    pub msp_id: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeystoreChaincode;

impl KeystoreChaincode {
    pub fn new() -> Self {
        Self
    }

    /// Store an organisation's public key under its MSP identifier.
    ///
    /// Returns the stored JSON so the caller can confirm what was written.
    pub fn add_organisation(&self, ledger: &mut dyn Ledger, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let [msp_id, public_key] = expect_args::<2>(args)?;

        let organisation = Organisation {
            msp_id: msp_id.clone(),
            public_key: public_key.clone(),
        };
        let bytes = serde_json::to_vec(&organisation).map_err(|e| ChaincodeError::Encode(e.to_string()))?;
        ledger.put_state(msp_id, &bytes)?;

        tracing::debug!(chaincode = KEYSTORE_CHAINCODE, msp_id, "organisation key stored");
        Ok(bytes)
    }

    /// Return the raw record stored under the given key.
    pub fn get_organisation(&self, ledger: &mut dyn Ledger, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let [key] = expect_args::<1>(args)?;
        ledger.get_state(key).map_err(|e| ChaincodeError::from_read(key, e))
    }
}

impl Chaincode for KeystoreChaincode {
    fn name(&self) -> &'static str {
        KEYSTORE_CHAINCODE
    }

    fn functions(&self) -> &'static [&'static str] {
        &[ADD_ORGANISATION, GET_ORGANISATION]
    }

    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        match function {
            ADD_ORGANISATION => self.add_organisation(ledger, args),
            GET_ORGANISATION => self.get_organisation(ledger, args),
            other => Err(unknown_function(KEYSTORE_CHAINCODE, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn add_returns_serialized_record() {
        let mut ledger = MemoryLedger::new();
        let out = KeystoreChaincode.add_organisation(&mut ledger, &args(&["Org1MSP", "pk-1"])).unwrap();
        assert_eq!(out, br#"{"mspID":"Org1MSP","publicKey":"pk-1"}"#);
        assert_eq!(ledger.raw("Org1MSP"), Some(out.as_slice()));
    }

    #[test]
    fn add_overwrites_existing_organisation() {
        let mut ledger = MemoryLedger::new();
        let cc = KeystoreChaincode::new();
        cc.add_organisation(&mut ledger, &args(&["Org1MSP", "old"])).unwrap();
        cc.add_organisation(&mut ledger, &args(&["Org1MSP", "new"])).unwrap();

        let stored = cc.get_organisation(&mut ledger, &args(&["Org1MSP"])).unwrap();
        let organisation: Organisation = serde_json::from_slice(&stored).unwrap();
        assert_eq!(organisation.public_key, "new");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn get_absent_key_is_empty_success() {
        let mut ledger = MemoryLedger::new();
        let out = KeystoreChaincode.get_organisation(&mut ledger, &args(&["Org9MSP"])).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn add_with_wrong_arity_writes_nothing() {
        let mut ledger = MemoryLedger::new();
        let err = KeystoreChaincode.add_organisation(&mut ledger, &args(&["Org1MSP"])).unwrap_err();
        assert!(matches!(err, ChaincodeError::IncorrectArgumentCount { expected: 2, given: 1 }));
        assert_eq!(ledger.write_count(), 0);
    }

    #[test]
    fn invoke_routes_by_function_name() {
        let mut ledger = MemoryLedger::new();
        let cc = KeystoreChaincode;
        cc.invoke(&mut ledger, ADD_ORGANISATION, &args(&["Org2MSP", "pk-2"])).unwrap();
        let out = cc.invoke(&mut ledger, GET_ORGANISATION, &args(&["Org2MSP"])).unwrap();
        assert_eq!(out, br#"{"mspID":"Org2MSP","publicKey":"pk-2"}"#);

        let err = cc.invoke(&mut ledger, "deleteOrganisation", &args(&["Org2MSP"])).unwrap_err();
        assert!(err.to_string().contains("deleteOrganisation"));
    }
}
