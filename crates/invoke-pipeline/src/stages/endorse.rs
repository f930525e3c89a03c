//! Endorsement

use crate::context::RequestContext;
use crate::error::InvokeError;
use crate::provider::Transactor;
use crate::txn::create_and_send_proposal;

/// Build the proposal and collect one response per target
///
/// The proposal and its transaction id are recorded before the send result
/// is inspected. On success the first response's payload becomes the
/// provisional result.
///
/// # Errors
/// `NoTargets` before any transactor call when targets are empty;
/// `ProposalFailure` for header, proposal or send failures.
pub async fn endorse(
    ctx: &mut RequestContext,
    transactor: &dyn Transactor,
) -> Result<(), InvokeError> {
    if ctx.targets.is_empty() {
        return Err(InvokeError::NoTargets);
    }

    let outcome = create_and_send_proposal(transactor, &ctx.request, &ctx.targets).await?;

    tracing::Span::current().record("txn_id", outcome.proposal.txn_id.as_str());
    ctx.response.transaction_id = Some(outcome.proposal.txn_id.clone());
    ctx.response.proposal = Some(outcome.proposal);

    let responses = outcome.responses?;
    if let Some(first) = responses.first() {
        ctx.response.payload = first.payload.clone();
    }
    tracing::debug!(responses = responses.len(), "collected endorsements");
    ctx.response.responses = responses;
    Ok(())
}
