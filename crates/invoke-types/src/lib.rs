//! Invoke Types
//!
//! Data model shared by the invocation pipeline and its collaborators:
//! - [`Request`]: the chaincode invocation requested by the caller
//! - [`TransactionHeader`] / [`TransactionProposal`]: what endorsers sign
//! - [`ProposalResponse`]: one endorser's verdict on a proposal
//! - [`Transaction`]: the endorsed proposal submitted for ordering
//! - [`TxValidationCode`] / [`TxStatusEvent`]: the ledger's final verdict
//!
//! # Example
//!
//! ```rust
//! use invoke_types::{Request, TransactionHeader, TransactionProposal};
//!
//! let request = Request::new("marbles", "transfer")
//!     .with_arg("marble1")
//!     .with_arg("bob");
//! let header = TransactionHeader::new("mychannel", b"client-identity".to_vec());
//! let proposal = TransactionProposal::new(header, request);
//!
//! assert_eq!(proposal.txn_id.as_str().len(), 64);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod peer;
mod request;
mod response;
mod transaction;
mod txn;
mod validation;

pub use peer::Peer;
pub use request::Request;
pub use response::{Endorsement, ProposalResponse, STATUS_SUCCESS};
pub use transaction::{Transaction, TransactionRequest, TransactionResponse};
pub use txn::{TransactionHeader, TransactionProposal, TxnId, NONCE_SIZE};
pub use validation::{TxStatusEvent, TxValidationCode, UnknownValidationCode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
