//! Transaction identifiers, headers and proposals
//!
//! A [`TxnId`] is derived from a random nonce and the creator identity, so
//! every proposal gets a fresh identifier even when the request repeats.

use crate::request::Request;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};

/// Size of the random nonce in a transaction header
pub const NONCE_SIZE: usize = 24;

/// Transaction identifier (lowercase hex SHA-256)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(String);

impl TxnId {
    /// Derive identifier from nonce and creator identity
    #[inline]
    #[must_use]
    pub fn compute(nonce: &[u8], creator: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(creator);
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an identifier received from elsewhere
    #[inline]
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for logs (first 12 chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl Display for TxnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TxnId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Header shared by a proposal and the transaction built from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Identifier derived from `nonce` and `creator`
    pub txn_id: TxnId,
    /// Channel the transaction targets
    pub channel_id: String,
    /// Serialized creator identity
    pub creator: Vec<u8>,
    /// Random nonce
    pub nonce: Vec<u8>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl TransactionHeader {
    /// Create header with a fresh random nonce
    #[must_use]
    pub fn new(channel_id: impl Into<String>, creator: Vec<u8>) -> Self {
        let mut nonce = vec![0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);
        Self::with_nonce(channel_id, creator, nonce)
    }

    /// Create header with a caller-chosen nonce
    #[must_use]
    pub fn with_nonce(channel_id: impl Into<String>, creator: Vec<u8>, nonce: Vec<u8>) -> Self {
        Self {
            txn_id: TxnId::compute(&nonce, &creator),
            channel_id: channel_id.into(),
            creator,
            nonce,
            timestamp: Utc::now(),
        }
    }
}

/// Proposal submitted to endorsing peers
///
/// Created once per invocation and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionProposal {
    /// Identifier shared with the header
    pub txn_id: TxnId,
    /// Transaction header
    pub header: TransactionHeader,
    /// Invocation the endorsers simulate
    pub request: Request,
}

impl TransactionProposal {
    /// Bind a request to a header
    #[inline]
    #[must_use]
    pub fn new(header: TransactionHeader, request: Request) -> Self {
        Self {
            txn_id: header.txn_id.clone(),
            header,
            request,
        }
    }
}
