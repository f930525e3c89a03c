//! Invocation entry point

use crate::chain::Pipeline;
use crate::config::InvokeConfig;
use crate::context::{ClientContext, RequestContext, RequestOptions, Response};
use crate::error::InvokeError;
use crate::stages::{Ed25519Verifier, EndorsementVerifier};
use invoke_types::Request;
use std::sync::Arc;
use std::time::Duration;

/// Result of one invocation
///
/// The response is returned even on failure, populated up to the stage
/// that failed.
#[derive(Debug)]
pub struct InvokeOutcome {
    /// Progressively populated response
    pub response: Response,
    /// First stage failure, if any
    pub error: Option<InvokeError>,
}

impl InvokeOutcome {
    /// Whether every stage succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Response on success, error otherwise
    ///
    /// # Errors
    /// The terminal stage failure.
    pub fn into_result(self) -> Result<Response, InvokeError> {
        match self.error {
            None => Ok(self.response),
            Some(err) => Err(err),
        }
    }
}

/// Runs query and execute pipelines against a set of collaborators
#[derive(Debug, Clone)]
pub struct Invoker {
    client: ClientContext,
    config: InvokeConfig,
    query: Pipeline,
    execute: Pipeline,
}

impl Invoker {
    /// Invoker using `config`
    ///
    /// With `verify_signatures` enabled both pipelines check every
    /// endorsement with an [`Ed25519Verifier`] that accepts any key.
    #[must_use]
    pub fn new(client: ClientContext, config: InvokeConfig) -> Self {
        let invoker = Self {
            client,
            config,
            query: Pipeline::query(None),
            execute: Pipeline::execute(None),
        };
        if invoker.config.verify_signatures {
            invoker.with_verifier(Arc::new(Ed25519Verifier::new()))
        } else {
            invoker
        }
    }

    /// Verify endorsements with `verifier` in both query and execute
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn EndorsementVerifier>) -> Self {
        self.query = Pipeline::query_verified(Arc::clone(&verifier), None);
        self.execute = Pipeline::execute_verified(verifier, None);
        self
    }

    /// Replace the query pipeline
    #[must_use]
    pub fn with_query_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.query = pipeline;
        self
    }

    /// Replace the execute pipeline
    #[must_use]
    pub fn with_execute_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.execute = pipeline;
        self
    }

    /// Collaborators
    #[inline]
    #[must_use]
    pub fn client(&self) -> &ClientContext {
        &self.client
    }

    /// Settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &InvokeConfig {
        &self.config
    }

    /// Endorse and validate without committing
    pub async fn query(&self, request: Request, options: RequestOptions) -> InvokeOutcome {
        self.invoke(&self.query, request, options, self.config.query_timeout())
            .await
    }

    /// Endorse, validate, commit and wait for the ledger verdict
    pub async fn execute(&self, request: Request, options: RequestOptions) -> InvokeOutcome {
        self.invoke(&self.execute, request, options, self.config.execute_timeout())
            .await
    }

    /// Run `pipeline`, applying `default_timeout` when the caller set none
    pub async fn invoke(
        &self,
        pipeline: &Pipeline,
        request: Request,
        mut options: RequestOptions,
        default_timeout: Duration,
    ) -> InvokeOutcome {
        options.timeout.get_or_insert(default_timeout);
        let mut ctx = RequestContext::from_options(request, options);

        let error = pipeline.run(&mut ctx, &self.client).await.err();
        InvokeOutcome {
            response: ctx.response,
            error,
        }
    }
}
