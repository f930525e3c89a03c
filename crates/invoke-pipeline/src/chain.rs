//! Chain builder and driver
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s built once and reused for
//! any number of invocations. Running it threads one [`RequestContext`]
//! through the stages in order and stops at the first failure.
//!
//! Two canonical pipelines are provided:
//! - [`Pipeline::query`]: resolve, endorse, validate
//! - [`Pipeline::execute`]: resolve, endorse, validate, commit and confirm
//!
//! Their `_verified` variants check endorsement signatures right after
//! validation.
//!
//! Each accepts one optional continuation stage. Longer tails are chained
//! explicitly with [`PipelineBuilder`].

use crate::context::{ClientContext, RequestContext};
use crate::error::InvokeError;
use crate::stages::{EndorsementVerifier, Flow, Handler, Stage};
use std::sync::Arc;
use tracing::Instrument;

/// Ordered, immutable sequence of stages
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Read-only pipeline that stops after endorsement validation
    #[must_use]
    pub fn query(next: Option<Stage>) -> Self {
        Self::builder()
            .resolve_targets()
            .endorse()
            .validate_endorsements()
            .then_maybe(next)
            .build()
    }

    /// [`Pipeline::query`] with signature verification after validation
    #[must_use]
    pub fn query_verified(verifier: Arc<dyn EndorsementVerifier>, next: Option<Stage>) -> Self {
        Self::builder()
            .resolve_targets()
            .endorse()
            .validate_endorsements()
            .stage(Stage::VerifySignatures(verifier))
            .then_maybe(next)
            .build()
    }

    /// State-changing pipeline that commits and waits for the verdict
    #[must_use]
    pub fn execute(next: Option<Stage>) -> Self {
        Self::builder()
            .resolve_targets()
            .endorse()
            .validate_endorsements()
            .commit_and_confirm()
            .then_maybe(next)
            .build()
    }

    /// [`Pipeline::execute`] with signature verification before commit
    #[must_use]
    pub fn execute_verified(verifier: Arc<dyn EndorsementVerifier>, next: Option<Stage>) -> Self {
        Self::builder()
            .resolve_targets()
            .endorse()
            .validate_endorsements()
            .stage(Stage::VerifySignatures(verifier))
            .commit_and_confirm()
            .then_maybe(next)
            .build()
    }

    /// Empty builder
    #[inline]
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Stages in execution order
    #[inline]
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of stages
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage against `ctx`
    ///
    /// Whatever the stages wrote before a failure stays on `ctx.response`.
    ///
    /// # Errors
    /// The first stage failure, or `Cancelled` if the invocation was
    /// cancelled before a stage started.
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        client: &ClientContext,
    ) -> Result<(), InvokeError> {
        let span = tracing::info_span!(
            "invoke",
            chaincode = %ctx.request.chaincode_id,
            function = %ctx.request.fcn,
            txn_id = tracing::field::Empty,
        );
        self.drive(ctx, client).instrument(span).await
    }

    async fn drive(
        &self,
        ctx: &mut RequestContext,
        client: &ClientContext,
    ) -> Result<(), InvokeError> {
        for stage in &self.stages {
            if ctx.is_cancelled() {
                tracing::warn!(stage = stage.name(), "invocation cancelled");
                return Err(InvokeError::Cancelled {
                    stage: stage.name().to_owned(),
                });
            }

            tracing::debug!(stage = stage.name(), "running stage");
            match stage.run(ctx, client).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => {
                    tracing::debug!(stage = stage.name(), "stage ended the chain");
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(stage = stage.name(), error = %err, "stage failed");
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

/// Builds a [`Pipeline`] stage by stage
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    /// Empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `stage`
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append `stage` if present
    #[must_use]
    pub fn then_maybe(self, stage: Option<Stage>) -> Self {
        match stage {
            Some(stage) => self.stage(stage),
            None => self,
        }
    }

    /// Append target resolution
    #[inline]
    #[must_use]
    pub fn resolve_targets(self) -> Self {
        self.stage(Stage::ResolveTargets)
    }

    /// Append endorsement
    #[inline]
    #[must_use]
    pub fn endorse(self) -> Self {
        self.stage(Stage::Endorse)
    }

    /// Append endorsement validation
    #[inline]
    #[must_use]
    pub fn validate_endorsements(self) -> Self {
        self.stage(Stage::ValidateEndorsements)
    }

    /// Append signature verification
    #[inline]
    #[must_use]
    pub fn verify_signatures(self, verifier: impl EndorsementVerifier + 'static) -> Self {
        self.stage(Stage::verify_signatures(verifier))
    }

    /// Append commit and confirm
    #[inline]
    #[must_use]
    pub fn commit_and_confirm(self) -> Self {
        self.stage(Stage::CommitAndConfirm)
    }

    /// Append a caller handler
    #[inline]
    #[must_use]
    pub fn custom(self, handler: impl Handler + 'static) -> Self {
        self.stage(Stage::custom(handler))
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
