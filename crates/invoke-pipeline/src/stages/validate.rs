//! Endorsement agreement

use crate::context::RequestContext;
use crate::error::InvokeError;
use invoke_types::ProposalResponse;

/// Require every response to succeed and carry the same payload
///
/// Responses are checked in order and the first offender wins. Each
/// response's status is checked before its payload. An empty list passes.
///
/// # Errors
/// `PeerRejection` for a non-success status, `EndorsementMismatch` naming
/// the first index whose payload differs from index 0.
pub fn validate_responses(responses: &[ProposalResponse]) -> Result<(), InvokeError> {
    let Some(first) = responses.first() else {
        return Ok(());
    };

    for (index, response) in responses.iter().enumerate() {
        if !response.is_success() {
            return Err(InvokeError::PeerRejection {
                endorser: response.endorser.clone(),
                status: response.status,
                message: response.message.clone(),
            });
        }
        if index > 0 && response.payload != first.payload {
            return Err(InvokeError::EndorsementMismatch { index });
        }
    }
    Ok(())
}

/// Validate the responses collected by the endorse stage
///
/// # Errors
/// See [`validate_responses`].
#[inline]
pub fn validate_endorsements(ctx: &RequestContext) -> Result<(), InvokeError> {
    validate_responses(&ctx.response.responses)
}
