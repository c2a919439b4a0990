//! Smart contracts for a permissioned logistics ledger.
//!
//! Three independent chaincodes share one execution model: the host hands
//! each transaction over as a function name plus positional string
//! arguments, the chaincode reads and writes a key-value world state, and
//! the outcome is returned as a success payload or an error message.
//!
//! - `keystore` – organisation public keys under their MSP identifier
//! - `transportChain` – one JSON array of participant chains under a single key
//! - `ubl` – base64 encoded shipment messages, validated then stored verbatim
//!
//! ## Invocation Lifecycle
//!
//! 1. The host decodes an `{"Args": [...]}` envelope into an [`Invocation`]
//! 2. [`ChaincodeRegistry`] resolves the target chaincode by name
//! 3. The ledger is wrapped in a [`NamespacedLedger`] for the configured prefixes
//! 4. The chaincode routes on the function name and touches the ledger
//! 5. The result is folded into a [`Response`] with status 200 or 500

pub mod config;
pub mod contracts;
pub mod error;
pub mod handler;
pub mod ledger;
pub mod marshal;
pub mod registry;

pub use config::ChaincodeConfig;
pub use contracts::Chain;
pub use contracts::ChainBook;
pub use contracts::KeystoreChaincode;
pub use contracts::Organisation;
pub use contracts::Participant;
pub use contracts::ShipmentMessage;
pub use contracts::TransportChainChaincode;
pub use contracts::UblChaincode;
pub use error::ChaincodeError;
pub use error::ChaincodeResult;
pub use handler::Chaincode;
pub use ledger::Ledger;
pub use ledger::LedgerError;
pub use ledger::MemoryLedger;
pub use ledger::NamespacedLedger;
pub use marshal::Invocation;
pub use marshal::Response;
pub use registry::ChaincodeRegistry;
