//! Chaincode invocation request

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chaincode invocation requested by the caller
///
/// Immutable once handed to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Chaincode to invoke
    pub chaincode_id: String,
    /// Function name
    pub fcn: String,
    /// Ordered arguments
    pub args: Vec<Vec<u8>>,
    /// Private data passed to the chaincode but kept out of the ledger
    pub transient_map: BTreeMap<String, Vec<u8>>,
}

impl Request {
    /// Create request with no arguments
    #[inline]
    #[must_use]
    pub fn new(chaincode_id: impl Into<String>, fcn: impl Into<String>) -> Self {
        Self {
            chaincode_id: chaincode_id.into(),
            fcn: fcn.into(),
            args: Vec::new(),
            transient_map: BTreeMap::new(),
        }
    }

    /// Append an argument
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(arg.as_ref().to_vec());
        self
    }

    /// Replace all arguments
    #[inline]
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args = args.into_iter().map(|a| a.as_ref().to_vec()).collect();
        self
    }

    /// Add a transient entry
    #[inline]
    #[must_use]
    pub fn with_transient(mut self, key: impl Into<String>, value: impl AsRef<[u8]>) -> Self {
        self.transient_map.insert(key.into(), value.as_ref().to_vec());
        self
    }
}
