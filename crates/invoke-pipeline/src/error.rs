//! Error types for the invocation pipeline
//!
//! Every stage failure is terminal for the invocation. Errors keep the
//! collaborator's failure as their `source` so callers can inspect it.

use crate::provider::BoxError;
use invoke_types::{TxValidationCode, TxnId};
use std::fmt;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// No endorsing peers after target resolution
    #[error("targets were not provided")]
    NoTargets,

    /// Selection service could not produce endorsers
    #[error("failed to get endorsing peers: {source}")]
    SelectionFailure {
        /// Underlying selection failure
        #[source]
        source: BoxError,
    },

    /// Header or proposal construction, or proposal send, failed
    #[error("{}", describe_proposal_failure(.step, .source))]
    ProposalFailure {
        /// Which step failed
        step: ProposalStep,
        /// Underlying transactor failure
        #[source]
        source: BoxError,
    },

    /// An endorser returned a non-success status
    #[error("endorsement validation failed: peer {endorser} returned status {status}: {message}")]
    PeerRejection {
        /// Endorser that rejected the proposal
        endorser: String,
        /// Peer-reported status
        status: i32,
        /// Peer-reported message
        message: String,
    },

    /// Successful endorsements disagree on the payload
    #[error(
        "endorsement validation failed: proposal response payloads do not match \
         (mismatch detected at index {index})"
    )]
    EndorsementMismatch {
        /// Position of the first response disagreeing with index 0
        index: usize,
    },

    /// A response carried no endorsement to verify
    #[error("signature validation failed: response from {endorser} carries no endorsement")]
    MissingEndorsement {
        /// Endorser whose response was unsigned
        endorser: String,
    },

    /// An endorsement signature did not verify
    #[error("signature validation failed for {endorser}: {source}")]
    InvalidSignature {
        /// Endorser whose signature was rejected
        endorser: String,
        /// Verifier failure
        #[source]
        source: BoxError,
    },

    /// Commit stage ran without a recorded proposal
    #[error("no transaction proposal to commit")]
    NoProposal,

    /// Could not subscribe for the outcome notification
    #[error("error registering for TxStatus event: {source}")]
    RegistrationFailure {
        /// Underlying event service failure
        #[source]
        source: BoxError,
    },

    /// Transaction assembly or broadcast failed
    #[error("create and send transaction failed: {step} failed: {source}")]
    CommitFailure {
        /// Which step failed
        step: CommitStep,
        /// Underlying transactor failure
        #[source]
        source: BoxError,
    },

    /// The ledger rejected the transaction
    #[error("received invalid transaction {txn_id}: {code}")]
    InvalidOutcome {
        /// Rejected transaction
        txn_id: TxnId,
        /// Ledger verdict
        code: TxValidationCode,
    },

    /// Cancellation fired before the outcome arrived
    #[error("execute did not receive confirmation for transaction {txn_id}")]
    ConfirmationTimeout {
        /// Unconfirmed transaction
        txn_id: TxnId,
    },

    /// Notification source closed without delivering an outcome
    #[error("event source closed before delivering the outcome of transaction {txn_id}")]
    EventSourceClosed {
        /// Unconfirmed transaction
        txn_id: TxnId,
    },

    /// Cancellation fired before a stage started
    #[error("invocation cancelled before {stage}")]
    Cancelled {
        /// Stage that did not start
        stage: String,
    },

    /// Caller-supplied stage failed
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        /// Stage name
        stage: String,
        /// Stage failure
        #[source]
        source: BoxError,
    },
}

/// Proposal steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStep {
    /// `create_transaction_header`
    CreateHeader,
    /// `create_proposal`
    CreateProposal,
    /// `send_transaction_proposal`
    Send,
}

impl fmt::Display for ProposalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateHeader => "creating transaction header",
            Self::CreateProposal => "creating transaction proposal",
            Self::Send => "sending transaction proposal",
        })
    }
}

// Send failures come from the network and are shown as reported.
fn describe_proposal_failure(step: &ProposalStep, source: &BoxError) -> String {
    match step {
        ProposalStep::Send => source.to_string(),
        _ => format!("{step} failed: {source}"),
    }
}

/// Commit steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    /// `create_transaction`
    CreateTransaction,
    /// `send_transaction`
    SendTransaction,
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateTransaction => "creating transaction",
            Self::SendTransaction => "sending transaction",
        })
    }
}

/// Error classification, one per taxonomy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`InvokeError::NoTargets`]
    NoTargets,
    /// [`InvokeError::SelectionFailure`]
    SelectionFailure,
    /// [`InvokeError::ProposalFailure`]
    ProposalFailure,
    /// [`InvokeError::PeerRejection`]
    PeerRejection,
    /// [`InvokeError::EndorsementMismatch`]
    EndorsementMismatch,
    /// Missing or invalid endorsement signature
    SignatureFailure,
    /// [`InvokeError::CommitFailure`] and [`InvokeError::NoProposal`]
    CommitFailure,
    /// [`InvokeError::InvalidOutcome`]
    InvalidOutcome,
    /// [`InvokeError::ConfirmationTimeout`] and [`InvokeError::EventSourceClosed`]
    ConfirmationTimeout,
    /// [`InvokeError::RegistrationFailure`]
    RegistrationFailure,
    /// [`InvokeError::Cancelled`]
    Cancelled,
    /// [`InvokeError::Stage`]
    Stage,
}

/// Component group a status code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusGroup {
    /// Raised by this client
    Client,
    /// Raised while checking endorser responses
    EndorserClient,
    /// Reported by an endorsing peer
    EndorserServer,
    /// Reported by the event source
    EventServer,
}

/// Client status codes
pub mod codes {
    /// Cause not classified
    pub const UNKNOWN: i32 = 1;
    /// Could not reach a collaborator
    pub const CONNECTION_FAILED: i32 = 2;
    /// Endorsement payloads disagree
    pub const ENDORSEMENT_MISMATCH: i32 = 3;
    /// No confirmation before cancellation
    pub const TIMEOUT: i32 = 5;
    /// No endorsing peers
    pub const NO_PEERS_FOUND: i32 = 6;
    /// Signature did not verify
    pub const SIGNATURE_VERIFICATION_FAILED: i32 = 8;
    /// Response carried no endorsement
    pub const MISSING_ENDORSEMENT: i32 = 9;
}

/// Group and numeric code describing an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status {
    /// Component group
    pub group: StatusGroup,
    /// Numeric code within the group
    pub code: i32,
}

impl Status {
    #[inline]
    const fn new(group: StatusGroup, code: i32) -> Self {
        Self { group, code }
    }
}

impl InvokeError {
    /// Classification of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoTargets => ErrorKind::NoTargets,
            Self::SelectionFailure { .. } => ErrorKind::SelectionFailure,
            Self::ProposalFailure { .. } => ErrorKind::ProposalFailure,
            Self::PeerRejection { .. } => ErrorKind::PeerRejection,
            Self::EndorsementMismatch { .. } => ErrorKind::EndorsementMismatch,
            Self::MissingEndorsement { .. } | Self::InvalidSignature { .. } => {
                ErrorKind::SignatureFailure
            }
            Self::NoProposal | Self::CommitFailure { .. } => ErrorKind::CommitFailure,
            Self::InvalidOutcome { .. } => ErrorKind::InvalidOutcome,
            Self::ConfirmationTimeout { .. } | Self::EventSourceClosed { .. } => {
                ErrorKind::ConfirmationTimeout
            }
            Self::RegistrationFailure { .. } => ErrorKind::RegistrationFailure,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Stage { .. } => ErrorKind::Stage,
        }
    }

    /// Group and code, for callers that map errors onto status codes
    #[must_use]
    pub fn status(&self) -> Status {
        use StatusGroup::{Client, EndorserClient, EndorserServer, EventServer};
        match self {
            Self::NoTargets => Status::new(Client, codes::NO_PEERS_FOUND),
            Self::SelectionFailure { .. } => Status::new(Client, codes::NO_PEERS_FOUND),
            Self::ProposalFailure { .. }
            | Self::RegistrationFailure { .. }
            | Self::CommitFailure { .. } => Status::new(Client, codes::CONNECTION_FAILED),
            Self::PeerRejection { status, .. } => Status::new(EndorserServer, *status),
            Self::EndorsementMismatch { .. } => {
                Status::new(EndorserClient, codes::ENDORSEMENT_MISMATCH)
            }
            Self::MissingEndorsement { .. } => {
                Status::new(EndorserClient, codes::MISSING_ENDORSEMENT)
            }
            Self::InvalidSignature { .. } => {
                Status::new(EndorserClient, codes::SIGNATURE_VERIFICATION_FAILED)
            }
            Self::InvalidOutcome { code, .. } => Status::new(EventServer, code.as_i32()),
            Self::ConfirmationTimeout { .. } | Self::EventSourceClosed { .. } => {
                Status::new(Client, codes::TIMEOUT)
            }
            Self::NoProposal | Self::Cancelled { .. } | Self::Stage { .. } => {
                Status::new(Client, codes::UNKNOWN)
            }
        }
    }

    /// Whether re-running the whole invocation may succeed
    ///
    /// Advisory only: the pipeline itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProposalFailure { step, .. } => matches!(step, ProposalStep::Send),
            Self::CommitFailure { step, .. } => matches!(step, CommitStep::SendTransaction),
            Self::InvalidOutcome { code, .. } => code.is_conflict(),
            Self::EndorsementMismatch { .. }
            | Self::ConfirmationTimeout { .. }
            | Self::EventSourceClosed { .. }
            | Self::RegistrationFailure { .. } => true,
            _ => false,
        }
    }

    /// Wrap a caller-supplied stage failure
    #[inline]
    pub fn stage(stage: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Stage {
            stage: stage.into(),
            source: source.into(),
        }
    }
}
