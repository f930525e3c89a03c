//! Invoke Pipeline - chaincode invocation client
//!
//! Drives one chaincode invocation through a fixed sequence of stages:
//! - resolve endorsing peers when the caller named none
//! - send the proposal to every target and collect the responses
//! - require unanimous, successful endorsements
//! - optionally verify endorsement signatures
//! - broadcast the transaction and wait for the ledger's verdict
//!
//! The network is reached only through the [`SelectionService`],
//! [`Transactor`] and [`EventService`] collaborators.
//!
//! # Example
//!
//! ```rust,ignore
//! use invoke_pipeline::prelude::*;
//!
//! # async fn example(client: ClientContext) -> Result<(), InvokeError> {
//! let invoker = Invoker::new(client, InvokeConfig::default());
//!
//! let request = Request::new("marbles", "transfer").with_args(["marble1", "bob"]);
//! let response = invoker
//!     .execute(request, RequestOptions::new())
//!     .await
//!     .into_result()?;
//!
//! println!("committed {:?}", response.transaction_id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod invoker;
pub mod logging;
pub mod provider;
pub mod stages;
pub mod txn;

pub use chain::{Pipeline, PipelineBuilder};
pub use config::{ConfigError, InvokeConfig, LogFormat, LoggingConfig};
pub use context::{ClientContext, RequestContext, RequestOptions, Response};
pub use error::{CommitStep, ErrorKind, InvokeError, ProposalStep, Status, StatusGroup};
pub use invoker::{InvokeOutcome, Invoker};
pub use logging::LoggingError;
pub use provider::{
    BoxError, EventService, PeerFilter, Registration, SelectionService, Transactor,
};
pub use stages::{Ed25519Verifier, EndorsementVerifier, Flow, Handler, SignatureError, Stage};
pub use txn::{create_and_send_proposal, create_and_send_transaction, ProposalOutcome};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for invoking chaincode
    pub use crate::{
        ClientContext, Flow, Handler, InvokeConfig, InvokeError, InvokeOutcome, Invoker,
        Pipeline, RequestContext, RequestOptions, Response, Stage,
    };
    pub use invoke_types::{Peer, Request, TxValidationCode, TxnId};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
