//! Collaborator contracts
//!
//! The pipeline orchestrates three external services and never looks past
//! these traits:
//! - [`SelectionService`]: picks endorsers when the caller supplied none
//! - [`Transactor`]: builds proposals and transactions and talks to the network
//! - [`EventService`]: delivers the ledger's verdict for one transaction

use invoke_types::{
    Peer, ProposalResponse, Request, Transaction, TransactionHeader, TransactionProposal,
    TransactionRequest, TransactionResponse, TxStatusEvent, TxnId,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use ulid::Ulid;

/// Opaque failure reported by a collaborator
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Predicate restricting which peers the selection service may return
pub type PeerFilter = Arc<dyn Fn(&Peer) -> bool + Send + Sync>;

/// Chooses endorsing peers for a chaincode
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SelectionService: Send + Sync {
    /// Peers able to endorse every chaincode in `chaincode_ids`
    async fn endorsers_for_chaincode(
        &self,
        chaincode_ids: &[String],
        filter: Option<PeerFilter>,
    ) -> Result<Vec<Peer>, BoxError>;
}

/// Builds, signs and sends proposals and transactions
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transactor: Send + Sync {
    /// Fresh header for a new transaction
    fn create_transaction_header(&self) -> Result<TransactionHeader, BoxError>;

    /// Signed proposal for `request` under `header`
    fn create_proposal(
        &self,
        header: TransactionHeader,
        request: &Request,
    ) -> Result<TransactionProposal, BoxError>;

    /// Send one proposal to every target, one response per reachable target
    async fn send_transaction_proposal(
        &self,
        proposal: &TransactionProposal,
        targets: &[Peer],
    ) -> Result<Vec<ProposalResponse>, BoxError>;

    /// Assemble the final transaction from endorsed responses
    fn create_transaction(&self, request: TransactionRequest) -> Result<Transaction, BoxError>;

    /// Broadcast the transaction to the ordering service
    async fn send_transaction(&self, transaction: &Transaction)
        -> Result<TransactionResponse, BoxError>;
}

/// Handle to a live outcome subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registration {
    id: Ulid,
    txn_id: TxnId,
}

impl Registration {
    /// New handle for `txn_id`
    #[inline]
    #[must_use]
    pub fn new(txn_id: TxnId) -> Self {
        Self {
            id: Ulid::new(),
            txn_id,
        }
    }

    /// Unique handle id
    #[inline]
    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Transaction the handle listens for
    #[inline]
    #[must_use]
    pub fn txn_id(&self) -> &TxnId {
        &self.txn_id
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.txn_id.short())
    }
}

/// Delivers transaction outcome notifications
///
/// Each registration yields at most one [`TxStatusEvent`].
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EventService: Send + Sync {
    /// Subscribe to the verdict for `txn_id`
    async fn register_tx_status_event(
        &self,
        txn_id: &TxnId,
    ) -> Result<(Registration, oneshot::Receiver<TxStatusEvent>), BoxError>;

    /// Drop a subscription; best effort, never fails
    fn unregister(&self, registration: Registration);
}
