//! The three deployed chaincodes.
//!
//! Each chaincode is stateless: everything it knows between calls lives in
//! the ledger.

pub mod keystore;
pub mod transport_chain;
pub mod ubl;

pub use keystore::KeystoreChaincode;
pub use keystore::Organisation;
pub use transport_chain::Chain;
pub use transport_chain::ChainBook;
pub use transport_chain::TransportChainChaincode;
pub use ubl::Participant;
pub use ubl::ShipmentMessage;
pub use ubl::UblChaincode;
