//! Invocation state threaded through the pipeline
//!
//! A [`RequestContext`] is owned by exactly one invocation. Stages mutate it
//! in order; once a stage fails the driver stops and whatever was written
//! so far stays readable on [`RequestContext::response`].

use crate::provider::{EventService, PeerFilter, SelectionService, Transactor};
use invoke_types::{Peer, ProposalResponse, Request, TransactionProposal, TxValidationCode, TxnId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Collaborators shared by every invocation of a client
#[derive(Clone)]
pub struct ClientContext {
    /// Endorser selection
    pub selection: Arc<dyn SelectionService>,
    /// Proposal and transaction plumbing
    pub transactor: Arc<dyn Transactor>,
    /// Outcome notifications
    pub event_service: Arc<dyn EventService>,
}

impl ClientContext {
    /// Bundle collaborators
    #[inline]
    #[must_use]
    pub fn new(
        selection: Arc<dyn SelectionService>,
        transactor: Arc<dyn Transactor>,
        event_service: Arc<dyn EventService>,
    ) -> Self {
        Self {
            selection,
            transactor,
            event_service,
        }
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext").finish_non_exhaustive()
    }
}

/// Per-call options supplied by the caller
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Explicit endorsers; empty means "ask the selection service"
    pub targets: Vec<Peer>,
    /// Restricts peers returned by the selection service
    pub selection_filter: Option<PeerFilter>,
    /// Deadline for the whole invocation
    pub timeout: Option<Duration>,
    /// Caller-controlled cancellation scope
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    /// Empty options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With explicit targets
    #[inline]
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<Peer>) -> Self {
        self.targets = targets;
        self
    }

    /// With selection filter
    #[inline]
    #[must_use]
    pub fn with_selection_filter(
        mut self,
        filter: impl Fn(&Peer) -> bool + Send + Sync + 'static,
    ) -> Self {
        let filter: PeerFilter = Arc::new(filter);
        self.selection_filter = Some(filter);
        self
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// With caller cancellation token
    #[inline]
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("targets", &self.targets)
            .field("selection_filter", &self.selection_filter.is_some())
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Progressively populated invocation result
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Proposal sent to endorsers
    pub proposal: Option<TransactionProposal>,
    /// Identifier of that proposal
    pub transaction_id: Option<TxnId>,
    /// Endorsement responses, in target order
    pub responses: Vec<ProposalResponse>,
    /// Payload of the first response
    pub payload: Vec<u8>,
    /// Ledger verdict, set by the commit stage
    pub tx_validation_code: Option<TxValidationCode>,
}

/// Mutable state of one invocation
pub struct RequestContext {
    /// The invocation request
    pub request: Request,
    /// Resolved endorsers
    pub targets: Vec<Peer>,
    /// Caller's selection predicate
    pub selection_filter: Option<PeerFilter>,
    /// Accumulated response
    pub response: Response,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context with no deadline and a fresh cancellation token
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            request,
            targets: Vec::new(),
            selection_filter: None,
            response: Response::default(),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Context built from caller options
    ///
    /// The context gets a child of the caller's token so cancelling the
    /// context never cancels the caller's scope.
    #[must_use]
    pub fn from_options(request: Request, options: RequestOptions) -> Self {
        let cancel = options
            .cancel
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        Self {
            request,
            targets: options.targets,
            selection_filter: options.selection_filter,
            response: Response::default(),
            cancel,
            deadline: options.timeout.map(|t| Instant::now() + t),
        }
    }

    /// With explicit targets
    #[inline]
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<Peer>) -> Self {
        self.targets = targets;
        self
    }

    /// With deadline `timeout` from now
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Cancellation token of this invocation
    #[inline]
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deadline, if any
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the token fired or the deadline passed
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes once the token fires or the deadline passes
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request", &self.request)
            .field("targets", &self.targets)
            .field("selection_filter", &self.selection_filter.is_some())
            .field("response", &self.response)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_carry_into_context() {
        let options = RequestOptions::new()
            .with_targets(vec![Peer::new("p1", "Org1MSP")])
            .with_selection_filter(|p| p.msp_id == "Org1MSP");
        let ctx = RequestContext::from_options(Request::new("cc", "get"), options);

        assert_eq!(ctx.targets.len(), 1);
        assert!(ctx.selection_filter.is_some());
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn child_token_follows_caller() {
        let caller = CancellationToken::new();
        let ctx = RequestContext::from_options(
            Request::new("cc", "get"),
            RequestOptions::new().with_cancel(caller.clone()),
        );

        caller.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn cancelling_context_leaves_caller_alone() {
        let caller = CancellationToken::new();
        let ctx = RequestContext::from_options(
            Request::new("cc", "get"),
            RequestOptions::new().with_cancel(caller.clone()),
        );

        ctx.cancellation_token().cancel();
        assert!(!caller.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires() {
        let ctx = RequestContext::new(Request::new("cc", "get")).with_timeout(Duration::from_secs(5));
        assert!(!ctx.is_cancelled());

        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }
}
