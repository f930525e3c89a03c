//! Commit and confirm
//!
//! The outcome subscription is taken before the transaction is broadcast so
//! a fast verdict cannot be missed, and it is released by a drop guard on
//! every exit path, including cancellation of the enclosing future.

use crate::context::{ClientContext, RequestContext};
use crate::error::InvokeError;
use crate::provider::{EventService, Registration};
use crate::txn::create_and_send_transaction;
use invoke_types::TxValidationCode;

/// Releases an outcome subscription when dropped
struct RegistrationGuard<'a> {
    events: &'a dyn EventService,
    registration: Option<Registration>,
}

impl<'a> RegistrationGuard<'a> {
    fn new(events: &'a dyn EventService, registration: Registration) -> Self {
        Self {
            events,
            registration: Some(registration),
        }
    }
}

impl Drop for RegistrationGuard<'_> {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.take() {
            tracing::trace!(%registration, "releasing tx status registration");
            self.events.unregister(registration);
        }
    }
}

/// Broadcast the endorsed transaction and wait for the ledger's verdict
///
/// Waits until the outcome arrives or the invocation is cancelled,
/// whichever happens first. The verdict is recorded on the response even
/// when it is not `VALID`.
///
/// # Errors
/// - `NoProposal` if no proposal was recorded
/// - `RegistrationFailure` if the subscription could not be taken
/// - `CommitFailure` if assembly or broadcast failed
/// - `InvalidOutcome` for any verdict other than `VALID`
/// - `ConfirmationTimeout` if cancellation won the race
/// - `EventSourceClosed` if the notification source went away
pub async fn commit_and_confirm(
    ctx: &mut RequestContext,
    client: &ClientContext,
) -> Result<(), InvokeError> {
    let proposal = ctx
        .response
        .proposal
        .as_ref()
        .ok_or(InvokeError::NoProposal)?;
    let txn_id = proposal.txn_id.clone();
    let events = client.event_service.as_ref();

    let (registration, notification) = events
        .register_tx_status_event(&txn_id)
        .await
        .map_err(|source| InvokeError::RegistrationFailure { source })?;
    let _guard = RegistrationGuard::new(events, registration);

    let ack = create_and_send_transaction(
        client.transactor.as_ref(),
        proposal,
        &ctx.response.responses,
    )
    .await?;
    tracing::debug!(txn_id = %txn_id, orderer = %ack.orderer, "transaction broadcast");

    let event = tokio::select! {
        received = notification => match received {
            Ok(event) => event,
            Err(_) => return Err(InvokeError::EventSourceClosed { txn_id }),
        },
        () = ctx.cancelled() => {
            return Err(InvokeError::ConfirmationTimeout { txn_id });
        }
    };

    let code = event.validation_code;
    ctx.response.tx_validation_code = Some(code);
    tracing::info!(
        txn_id = %txn_id,
        code = %code,
        block = event.block_number,
        "received transaction outcome"
    );

    if code != TxValidationCode::Valid {
        return Err(InvokeError::InvalidOutcome { txn_id, code });
    }
    Ok(())
}
