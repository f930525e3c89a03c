//! Proposal and transaction helpers
//!
//! Thin request/response transformations over a [`Transactor`]; they hold
//! no state and never touch the invocation context.

use crate::error::{CommitStep, InvokeError, ProposalStep};
use crate::provider::Transactor;
use invoke_types::{
    Peer, ProposalResponse, Request, TransactionProposal, TransactionRequest, TransactionResponse,
};

/// A proposal together with the result of sending it
///
/// The proposal is kept even when the send fails so its transaction id can
/// still be reported.
#[derive(Debug)]
pub struct ProposalOutcome {
    /// The proposal that was sent
    pub proposal: TransactionProposal,
    /// Responses from the targets, or the send failure
    pub responses: Result<Vec<ProposalResponse>, InvokeError>,
}

/// Build a proposal for `request` and send it to every target
///
/// # Errors
/// Returns `ProposalFailure` when the header or proposal cannot be built.
/// A failed send is reported inside the returned [`ProposalOutcome`].
pub async fn create_and_send_proposal(
    transactor: &dyn Transactor,
    request: &Request,
    targets: &[Peer],
) -> Result<ProposalOutcome, InvokeError> {
    let header = transactor
        .create_transaction_header()
        .map_err(|source| InvokeError::ProposalFailure {
            step: ProposalStep::CreateHeader,
            source,
        })?;

    let proposal = transactor
        .create_proposal(header, request)
        .map_err(|source| InvokeError::ProposalFailure {
            step: ProposalStep::CreateProposal,
            source,
        })?;

    tracing::debug!(
        txn_id = %proposal.txn_id,
        targets = targets.len(),
        "sending transaction proposal"
    );

    let responses = transactor
        .send_transaction_proposal(&proposal, targets)
        .await
        .map_err(|source| InvokeError::ProposalFailure {
            step: ProposalStep::Send,
            source,
        });

    Ok(ProposalOutcome {
        proposal,
        responses,
    })
}

/// Assemble a transaction from endorsed responses and broadcast it
///
/// # Errors
/// Returns `CommitFailure` naming the step that failed.
pub async fn create_and_send_transaction(
    transactor: &dyn Transactor,
    proposal: &TransactionProposal,
    responses: &[ProposalResponse],
) -> Result<TransactionResponse, InvokeError> {
    let request = TransactionRequest {
        proposal: proposal.clone(),
        proposal_responses: responses.to_vec(),
    };

    let transaction =
        transactor
            .create_transaction(request)
            .map_err(|source| InvokeError::CommitFailure {
                step: CommitStep::CreateTransaction,
                source,
            })?;

    transactor
        .send_transaction(&transaction)
        .await
        .map_err(|source| InvokeError::CommitFailure {
            step: CommitStep::SendTransaction,
            source,
        })
}
