//! Ledger validation verdicts

use crate::txn::TxnId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Final verdict of the validating peers on a committed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum TxValidationCode {
    /// Transaction committed
    Valid = 0,
    /// Envelope was empty
    NilEnvelope = 1,
    /// Payload could not be decoded
    BadPayload = 2,
    /// Common header malformed
    BadCommonHeader = 3,
    /// Creator signature did not verify
    BadCreatorSignature = 4,
    /// Endorser transaction malformed
    InvalidEndorserTransaction = 5,
    /// Config transaction malformed
    InvalidConfigTransaction = 6,
    /// Payload type not supported
    UnsupportedTxPayload = 7,
    /// Transaction id does not match its header
    BadProposalTxId = 8,
    /// Transaction id already on the ledger
    DuplicateTxId = 9,
    /// Endorsements do not satisfy the endorsement policy
    EndorsementPolicyFailure = 10,
    /// Read set is stale
    MvccReadConflict = 11,
    /// Range query result changed since simulation
    PhantomReadConflict = 12,
    /// Unknown transaction type
    UnknownTxType = 13,
    /// Channel not found
    TargetChainNotFound = 14,
    /// Transaction could not be marshalled
    MarshalTxError = 15,
    /// Transaction action missing
    NilTxAction = 16,
    /// Chaincode has expired
    ExpiredChaincode = 17,
    /// Chaincode version mismatch
    ChaincodeVersionConflict = 18,
    /// Header extension malformed
    BadHeaderExtension = 19,
    /// Channel header malformed
    BadChannelHeader = 20,
    /// Response payload malformed
    BadResponsePayload = 21,
    /// Read/write set malformed
    BadRwset = 22,
    /// Write set not permitted
    IllegalWriteset = 23,
    /// Write set invalid
    InvalidWriteset = 24,
    /// Not yet validated
    NotValidated = 254,
    /// Rejected for an unlisted reason
    InvalidOtherReason = 255,
}

/// Integer that does not name a [`TxValidationCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction validation code: {0}")]
pub struct UnknownValidationCode(pub i32);

impl TxValidationCode {
    const ALL: [TxValidationCode; 27] = [
        Self::Valid,
        Self::NilEnvelope,
        Self::BadPayload,
        Self::BadCommonHeader,
        Self::BadCreatorSignature,
        Self::InvalidEndorserTransaction,
        Self::InvalidConfigTransaction,
        Self::UnsupportedTxPayload,
        Self::BadProposalTxId,
        Self::DuplicateTxId,
        Self::EndorsementPolicyFailure,
        Self::MvccReadConflict,
        Self::PhantomReadConflict,
        Self::UnknownTxType,
        Self::TargetChainNotFound,
        Self::MarshalTxError,
        Self::NilTxAction,
        Self::ExpiredChaincode,
        Self::ChaincodeVersionConflict,
        Self::BadHeaderExtension,
        Self::BadChannelHeader,
        Self::BadResponsePayload,
        Self::BadRwset,
        Self::IllegalWriteset,
        Self::InvalidWriteset,
        Self::NotValidated,
        Self::InvalidOtherReason,
    ];

    /// Numeric wire value
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Whether the transaction was committed
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Whether the rejection came from concurrent writers rather than the request itself
    #[inline]
    #[must_use]
    pub const fn is_conflict(self) -> bool {
        matches!(self, Self::MvccReadConflict | Self::PhantomReadConflict)
    }

    /// Canonical upper-case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::NilEnvelope => "NIL_ENVELOPE",
            Self::BadPayload => "BAD_PAYLOAD",
            Self::BadCommonHeader => "BAD_COMMON_HEADER",
            Self::BadCreatorSignature => "BAD_CREATOR_SIGNATURE",
            Self::InvalidEndorserTransaction => "INVALID_ENDORSER_TRANSACTION",
            Self::InvalidConfigTransaction => "INVALID_CONFIG_TRANSACTION",
            Self::UnsupportedTxPayload => "UNSUPPORTED_TX_PAYLOAD",
            Self::BadProposalTxId => "BAD_PROPOSAL_TXID",
            Self::DuplicateTxId => "DUPLICATE_TXID",
            Self::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            Self::MvccReadConflict => "MVCC_READ_CONFLICT",
            Self::PhantomReadConflict => "PHANTOM_READ_CONFLICT",
            Self::UnknownTxType => "UNKNOWN_TX_TYPE",
            Self::TargetChainNotFound => "TARGET_CHAIN_NOT_FOUND",
            Self::MarshalTxError => "MARSHAL_TX_ERROR",
            Self::NilTxAction => "NIL_TXACTION",
            Self::ExpiredChaincode => "EXPIRED_CHAINCODE",
            Self::ChaincodeVersionConflict => "CHAINCODE_VERSION_CONFLICT",
            Self::BadHeaderExtension => "BAD_HEADER_EXTENSION",
            Self::BadChannelHeader => "BAD_CHANNEL_HEADER",
            Self::BadResponsePayload => "BAD_RESPONSE_PAYLOAD",
            Self::BadRwset => "BAD_RWSET",
            Self::IllegalWriteset => "ILLEGAL_WRITESET",
            Self::InvalidWriteset => "INVALID_WRITESET",
            Self::NotValidated => "NOT_VALIDATED",
            Self::InvalidOtherReason => "INVALID_OTHER_REASON",
        }
    }
}

impl Display for TxValidationCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_i32())
    }
}

impl TryFrom<i32> for TxValidationCode {
    type Error = UnknownValidationCode;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.as_i32() == value)
            .ok_or(UnknownValidationCode(value))
    }
}

impl From<TxValidationCode> for i32 {
    fn from(code: TxValidationCode) -> Self {
        code.as_i32()
    }
}

/// Outcome notification for one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatusEvent {
    /// Transaction the verdict is for
    pub txn_id: TxnId,
    /// The verdict
    pub validation_code: TxValidationCode,
    /// Block that carried the transaction
    pub block_number: u64,
    /// Peer that delivered the event
    pub source_url: String,
}

impl TxStatusEvent {
    /// Create event
    #[inline]
    #[must_use]
    pub fn new(txn_id: TxnId, validation_code: TxValidationCode, block_number: u64) -> Self {
        Self {
            txn_id,
            validation_code,
            block_number,
            source_url: String::new(),
        }
    }

    /// Set the delivering peer
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = source_url.into();
        self
    }
}
