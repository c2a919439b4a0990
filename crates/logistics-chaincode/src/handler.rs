//! The chaincode contract the host runtime drives.
//!
//! A chaincode exposes two entry points: `init`, called once when the
//! chaincode is instantiated, and `invoke`, called per transaction with a
//! function name and positional string arguments. Each implementation routes
//! the function name to one of its handlers; anything else is rejected with
//! [`ChaincodeError::UnknownFunction`].
//!
//! Handlers validate arity with [`expect_args`] before touching the ledger,
//! so a rejected call never writes.

use crate::error::ChaincodeError;
use crate::error::ChaincodeResult;
use crate::ledger::Ledger;

pub trait Chaincode: Send + Sync {
    /// Name the chaincode is deployed under.
    fn name(&self) -> &'static str;

    /// Function names this chaincode routes.
    fn functions(&self) -> &'static [&'static str];

    /// Instantiate the chaincode. No ledger initialization is required.
    fn init(&self, _ledger: &mut dyn Ledger, _args: &[String]) -> ChaincodeResult<Vec<u8>> {
        Ok(Vec::new())
    }

    /// Route `function` to a handler.
    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>>;

    fn can_handle(&self, function: &str) -> bool {
        self.functions().contains(&function)
    }
}

/// Require exactly `N` positional arguments and borrow them as an array.
pub fn expect_args<const N: usize>(args: &[String]) -> ChaincodeResult<&[String; N]> {
    args.try_into().map_err(|_| ChaincodeError::IncorrectArgumentCount {
        expected: N,
        given: args.len(),
    })
}

/// Build the routing error for a function this chaincode does not serve.
pub fn unknown_function(chaincode: &str, function: &str) -> ChaincodeError {
    tracing::debug!(chaincode, function, "rejecting unknown chaincode function");
    ChaincodeError::UnknownFunction {
        function: function.to_string(),
    }
}
