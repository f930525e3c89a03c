//! Target resolution

use crate::context::RequestContext;
use crate::error::InvokeError;
use crate::provider::SelectionService;

/// Ask the selection service for endorsers when the caller gave none
///
/// An explicit, non-empty target list is left untouched and the selection
/// service is not consulted.
///
/// # Errors
/// `SelectionFailure` if the selection service fails; targets stay empty.
pub async fn resolve_targets(
    ctx: &mut RequestContext,
    selection: &dyn SelectionService,
) -> Result<(), InvokeError> {
    if !ctx.targets.is_empty() {
        return Ok(());
    }

    let chaincode_ids = [ctx.request.chaincode_id.clone()];
    let endorsers = selection
        .endorsers_for_chaincode(&chaincode_ids, ctx.selection_filter.clone())
        .await
        .map_err(|source| InvokeError::SelectionFailure { source })?;

    tracing::debug!(
        chaincode = %ctx.request.chaincode_id,
        endorsers = endorsers.len(),
        "selected endorsing peers"
    );
    ctx.targets = endorsers;
    Ok(())
}
