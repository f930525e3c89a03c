//! Invoke Events - in-process transaction status delivery
//!
//! [`TxStatusDispatcher`] is an [`EventService`](invoke_pipeline::EventService) fed by whatever observes
//! committed blocks. Each transaction id has at most one live registration
//! and each registration receives at most one [`TxStatusEvent`](invoke_types::TxStatusEvent).
//!
//! # Example
//!
//! ```rust
//! use invoke_events::TxStatusDispatcher;
//! use invoke_types::{TxStatusEvent, TxValidationCode, TxnId};
//!
//! let dispatcher = TxStatusDispatcher::new();
//! let txn_id = TxnId::from_string("abc");
//! let (_registration, mut rx) = dispatcher.register(&txn_id).unwrap();
//!
//! assert!(dispatcher.publish(TxStatusEvent::new(txn_id, TxValidationCode::Valid, 1)));
//! assert_eq!(rx.try_recv().unwrap().validation_code, TxValidationCode::Valid);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod dispatcher;

pub use dispatcher::{DispatchError, DispatchStats, TxStatusDispatcher};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
