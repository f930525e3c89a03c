//! Final transactions submitted for ordering

use crate::response::ProposalResponse;
use crate::txn::{TransactionProposal, TxnId};
use serde::{Deserialize, Serialize};

/// Input for assembling a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// The endorsed proposal
    pub proposal: TransactionProposal,
    /// Accepted endorsement responses
    pub proposal_responses: Vec<ProposalResponse>,
}

/// Transaction assembled from an endorsed proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The endorsed proposal
    pub proposal: TransactionProposal,
    /// Endorsements backing it
    pub endorsements: Vec<ProposalResponse>,
}

impl Transaction {
    /// Identifier inherited from the proposal
    #[inline]
    #[must_use]
    pub fn txn_id(&self) -> &TxnId {
        &self.proposal.txn_id
    }
}

impl From<TransactionRequest> for Transaction {
    fn from(request: TransactionRequest) -> Self {
        Self {
            proposal: request.proposal,
            endorsements: request.proposal_responses,
        }
    }
}

/// Orderer acknowledgement of a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Orderer that accepted the transaction
    pub orderer: String,
    /// Broadcast status
    pub status: i32,
}
