//! JSON marshaling between the host envelope and chaincode calls.
//!
//! The host hands each transaction over as `{"Args": ["function", "arg1", ...]}`
//! and expects a peer response back. The first element of `Args` is the
//! function name; the rest are the positional parameters. Response payloads
//! are arbitrary bytes and travel base64-encoded inside the JSON.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ChaincodeResult;

/// Status of a successful response.
pub const OK: u16 = 200;
/// Status of a failed response.
pub const ERROR: u16 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(rename = "Args")]
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(function: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = vec![function.to_string()];
        args.extend(params.into_iter().map(Into::into));
        Self { args }
    }

    /// Split into function name and parameters.
    ///
    /// An empty argument list yields an empty function name.
    pub fn function_and_parameters(&self) -> (&str, &[String]) {
        match self.args.split_first() {
            Some((function, params)) => (function.as_str(), params),
            None => ("", &[]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, with = "base64_bytes")]
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ERROR,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OK
    }
}

impl From<ChaincodeResult<Vec<u8>>> for Response {
    fn from(result: ChaincodeResult<Vec<u8>>) -> Self {
        match result {
            Ok(payload) => Response::success(payload),
            Err(e) => Response::error(e.to_string()),
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Deserialize a transaction envelope from the host.
pub fn decode_invocation(bytes: &[u8]) -> anyhow::Result<Invocation> {
    serde_json::from_slice(bytes).map_err(|e| anyhow::anyhow!("failed to deserialize invocation: {e}"))
}

/// Serialize a response for the host.
pub fn encode_response(response: &Response) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(response).map_err(|e| anyhow::anyhow!("failed to serialize response: {e}"))
}

/// Decode a response produced by [`encode_response`].
pub fn decode_response(bytes: &[u8]) -> anyhow::Result<Response> {
    serde_json::from_slice(bytes).map_err(|e| anyhow::anyhow!("failed to deserialize response: {e}"))
}

/// Encode a JSON payload for `addMessage` the way submitting clients do.
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
