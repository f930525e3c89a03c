//! Pipeline stages
//!
//! Built-in stages are a closed set of [`Stage`] variants; callers extend a
//! pipeline with [`Stage::Custom`] handlers. Every stage consumes and
//! produces the shared [`RequestContext`] and either lets the chain
//! continue or aborts it with an [`InvokeError`].

mod commit;
mod endorse;
mod resolve;
mod signature;
mod validate;

pub use commit::commit_and_confirm;
pub use endorse::endorse;
pub use resolve::resolve_targets;
pub use signature::{verify_signatures, Ed25519Verifier, EndorsementVerifier, SignatureError};
pub use validate::{validate_endorsements, validate_responses};

use crate::context::{ClientContext, RequestContext};
use crate::error::InvokeError;
use std::fmt;
use std::sync::Arc;

/// What the chain does after a stage succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next stage
    Continue,
    /// End the chain successfully
    Stop,
}

/// Caller-supplied stage
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Inspect or mutate the invocation
    async fn handle(
        &self,
        ctx: &mut RequestContext,
        client: &ClientContext,
    ) -> Result<Flow, InvokeError>;
}

/// One step of a pipeline
#[derive(Clone)]
pub enum Stage {
    /// Fill an empty target list from the selection service
    ResolveTargets,
    /// Send the proposal to every target
    Endorse,
    /// Require unanimous, successful endorsements
    ValidateEndorsements,
    /// Verify every endorsement signature
    VerifySignatures(Arc<dyn EndorsementVerifier>),
    /// Broadcast the transaction and wait for the ledger verdict
    CommitAndConfirm,
    /// Caller extension
    Custom(Arc<dyn Handler>),
}

impl Stage {
    /// Wrap a caller handler
    #[inline]
    pub fn custom(handler: impl Handler + 'static) -> Self {
        Self::Custom(Arc::new(handler))
    }

    /// Signature verification with `verifier`
    #[inline]
    pub fn verify_signatures(verifier: impl EndorsementVerifier + 'static) -> Self {
        Self::VerifySignatures(Arc::new(verifier))
    }

    /// Stage name for logs and errors
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ResolveTargets => "resolve_targets",
            Self::Endorse => "endorse",
            Self::ValidateEndorsements => "validate_endorsements",
            Self::VerifySignatures(_) => "verify_signatures",
            Self::CommitAndConfirm => "commit_and_confirm",
            Self::Custom(handler) => handler.name(),
        }
    }

    /// Run this stage against `ctx`
    ///
    /// # Errors
    /// Returns the stage's failure; the caller must not run later stages.
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        client: &ClientContext,
    ) -> Result<Flow, InvokeError> {
        match self {
            Self::ResolveTargets => resolve_targets(ctx, client.selection.as_ref()).await?,
            Self::Endorse => endorse(ctx, client.transactor.as_ref()).await?,
            Self::ValidateEndorsements => validate_endorsements(ctx)?,
            Self::VerifySignatures(verifier) => verify_signatures(ctx, verifier.as_ref())?,
            Self::CommitAndConfirm => commit_and_confirm(ctx, client).await?,
            Self::Custom(handler) => return handler.handle(ctx, client).await,
        }
        Ok(Flow::Continue)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
