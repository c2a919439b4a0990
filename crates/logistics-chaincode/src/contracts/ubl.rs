//! Encrypted UBL shipment messages.
//!
//! `addMessage` receives a base64-encoded JSON document, checks that it has
//! the shape of a [`ShipmentMessage`], and stores the decoded bytes exactly
//! as received. The parsed value is discarded: re-encoding it could reorder
//! fields or drop ones this chaincode does not know about.

use base64::Engine;
use base64::alphabet;
use base64::engine::GeneralPurpose;
use base64::engine::GeneralPurposeConfig;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::config::ChaincodeConfig;
use crate::config::constants::UBL_CHAINCODE;
use crate::error::ChaincodeError;
use crate::error::ChaincodeResult;
use crate::handler::Chaincode;
use crate::handler::expect_args;
use crate::handler::unknown_function;
use crate::ledger::Ledger;

pub const ADD_MESSAGE: &str = "addMessage";
pub const GET_MESSAGE: &str = "getMessage";

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Null entries in the participant list decode as empty participants.
fn participants_or_default<'de, D>(deserializer: D) -> Result<Vec<Participant>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<Option<Participant>>> = Option::deserialize(deserializer)?;
    Ok(entries.unwrap_or_default().into_iter().map(Option::unwrap_or_default).collect())
}

/// An organisation entitled to read the message, with its copy of the
/// message key encrypted to that organisation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Participant {
    #[serde(rename = "MSPID", deserialize_with = "null_as_default")]
    pub msp_id: String,
    /// Wire name carries a historical misspelling; stored documents use it.
    #[serde(rename = "enryptedKey", deserialize_with = "null_as_default")]
    pub encrypted_key: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipmentMessage {
    #[serde(rename = "documentID", deserialize_with = "null_as_default")]
    pub document_id: String,
    #[serde(rename = "organisationID", deserialize_with = "null_as_default")]
    pub organisation_id: String,
    #[serde(rename = "supplyChainID", deserialize_with = "null_as_default")]
    pub supply_chain_id: String,
    #[serde(rename = "containerID", deserialize_with = "null_as_default")]
    pub container_id: String,
    #[serde(rename = "senderParty", deserialize_with = "null_as_default")]
    pub sender_party: String,
    #[serde(rename = "RFIDTransportEquipment", deserialize_with = "null_as_default")]
    pub rfid_transport_equipment: String,
    #[serde(rename = "RFIDTransportHandlingUnit", deserialize_with = "null_as_default")]
    pub rfid_transport_handling_unit: String,
    #[serde(rename = "statusTypeCode", deserialize_with = "null_as_default")]
    pub status_type_code: String,
    #[serde(rename = "encryptedMessage", deserialize_with = "null_as_default")]
    pub encrypted_message: String,
    #[serde(deserialize_with = "participants_or_default")]
    pub participants: Vec<Participant>,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(rename = "carrierAssignedID", deserialize_with = "null_as_default")]
    pub carrier_assigned_id: String,
    #[serde(rename = "shippingOrderID", deserialize_with = "null_as_default")]
    pub shipping_order_id: String,
    #[serde(rename = "emptyFullIndicator", deserialize_with = "null_as_default")]
    pub empty_full_indicator: String,
    #[serde(rename = "contentType", deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(rename = "contentTypeSchemeVersion", deserialize_with = "null_as_default")]
    pub content_type_scheme_version: String,
    #[serde(rename = "statusLocationId", deserialize_with = "null_as_default")]
    pub status_location_id: String,
}

impl ShipmentMessage {
    /// Check that `bytes` is a JSON document of this shape.
    ///
    /// The top level must be an object (or `null`). Missing fields are
    /// allowed and unknown fields are ignored, but a known field holding the
    /// wrong JSON type is rejected. Keys resolve to fields by exact name
    /// first, then ignoring ASCII case, and every occurrence is checked.
    pub fn validate(bytes: &[u8]) -> ChaincodeResult<()> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| ChaincodeError::InvalidJson(e.to_string()))?;
        let entries = match value {
            Value::Null => return Ok(()),
            Value::Object(entries) => entries,
            other => {
                return Err(ChaincodeError::InvalidJson(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )));
            }
        };

        for (key, value) in entries {
            let Some(field) = resolve_field(&MESSAGE_FIELDS, &key) else {
                continue;
            };
            let value = if field == PARTICIPANTS_FIELD {
                fold_participants(value)?
            } else {
                value
            };
            check_field::<ShipmentMessage>(field, value)?;
        }
        Ok(())
    }
}

const PARTICIPANTS_FIELD: &str = "participants";

const MESSAGE_FIELDS: [&str; 17] = [
    "documentID",
    "organisationID",
    "supplyChainID",
    "containerID",
    "senderParty",
    "RFIDTransportEquipment",
    "RFIDTransportHandlingUnit",
    "statusTypeCode",
    "encryptedMessage",
    PARTICIPANTS_FIELD,
    "timestamp",
    "carrierAssignedID",
    "shippingOrderID",
    "emptyFullIndicator",
    "contentType",
    "contentTypeSchemeVersion",
    "statusLocationId",
];

const PARTICIPANT_FIELDS: [&str; 2] = ["MSPID", "enryptedKey"];

/// Match a document key to a declared wire name: exact first, then ignoring ASCII case.
fn resolve_field(fields: &[&'static str], key: &str) -> Option<&'static str> {
    fields
        .iter()
        .copied()
        .find(|field| *field == key)
        .or_else(|| fields.iter().copied().find(|field| field.eq_ignore_ascii_case(key)))
}

/// Decode a single entry into `T` under its declared wire name.
fn check_field<T: DeserializeOwned>(field: &str, value: Value) -> ChaincodeResult<()> {
    let single = Map::from_iter([(field.to_string(), value)]);
    T::deserialize(Value::Object(single)).map(drop).map_err(|e| ChaincodeError::InvalidJson(e.to_string()))
}

/// Check every participant entry and rewrite its keys to the declared wire names.
fn fold_participants(value: Value) -> ChaincodeResult<Value> {
    let items = match value {
        Value::Array(items) => items,
        other => return Ok(other),
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Null => Ok(Value::Null),
            Value::Object(entries) => {
                let mut folded = Map::new();
                for (key, value) in entries {
                    if let Some(field) = resolve_field(&PARTICIPANT_FIELDS, &key) {
                        check_field::<Participant>(field, value.clone())?;
                        folded.insert(field.to_string(), value);
                    }
                }
                Ok(Value::Object(folded))
            }
            other => Err(ChaincodeError::InvalidJson(format!(
                "expected participant object, found {}",
                json_kind(&other)
            ))),
        })
        .collect::<ChaincodeResult<Vec<_>>>()
        .map(Value::Array)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Standard alphabet, padding required, non-zero trailing bits in the last symbol tolerated.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode a submitted payload. Line breaks inserted by wrapping encoders are skipped.
fn decode_payload(data: &str) -> ChaincodeResult<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    PAYLOAD_ENGINE.decode(compact).map_err(|e| ChaincodeError::Base64Decode(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct UblChaincode {
    saved_reply: String,
}

impl Default for UblChaincode {
    fn default() -> Self {
        Self::new(&ChaincodeConfig::default())
    }
}

impl UblChaincode {
    pub fn new(config: &ChaincodeConfig) -> Self {
        Self {
            saved_reply: config.message_saved_reply.clone(),
        }
    }

    /// Validate and store a base64-encoded shipment message under `key`.
    ///
    /// Argument order: encoded payload, then storage key.
    pub fn add_message(&self, ledger: &mut dyn Ledger, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        tracing::info!(chaincode = UBL_CHAINCODE, "addMessage called");
        let [data, key] = expect_args::<2>(args)?;

        let decoded = decode_payload(data)?;
        ShipmentMessage::validate(&decoded)?;
        ledger.put_state(key, &decoded)?;

        tracing::debug!(chaincode = UBL_CHAINCODE, key, size = decoded.len(), "shipment message stored");
        Ok(self.saved_reply.as_bytes().to_vec())
    }

    /// Return the raw message bytes stored under the given key.
    pub fn get_message(&self, ledger: &mut dyn Ledger, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let [key] = expect_args::<1>(args)?;
        ledger.get_state(key).map_err(|e| ChaincodeError::from_read(key, e))
    }
}

impl Chaincode for UblChaincode {
    fn name(&self) -> &'static str {
        UBL_CHAINCODE
    }

    fn functions(&self) -> &'static [&'static str] {
        &[ADD_MESSAGE, GET_MESSAGE]
    }

    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        tracing::info!(chaincode = UBL_CHAINCODE, function, "invoking chaincode function");
        match function {
            ADD_MESSAGE => self.add_message(ledger, args),
            GET_MESSAGE => self.get_message(ledger, args),
            other => Err(unknown_function(UBL_CHAINCODE, other)),
        }
    }
}
