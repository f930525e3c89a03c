//! Endorsement responses

use serde::{Deserialize, Serialize};

/// Status reported by a peer for a successful simulation
pub const STATUS_SUCCESS: i32 = 200;

/// Endorser signature over a proposal response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    /// Serialized endorser identity (public key bytes)
    pub endorser: Vec<u8>,
    /// Signature over [`ProposalResponse::signed_bytes`]
    pub signature: Vec<u8>,
}

/// One peer's verdict on a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    /// Peer that produced this response
    pub endorser: String,
    /// Peer-reported status (`200` on success)
    pub status: i32,
    /// Peer-reported message, usually empty on success
    pub message: String,
    /// Chaincode result payload
    pub payload: Vec<u8>,
    /// Signature, absent when the peer refused to endorse
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    /// Successful response carrying `payload`
    #[inline]
    #[must_use]
    pub fn success(endorser: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            endorser: endorser.into(),
            status: STATUS_SUCCESS,
            message: String::new(),
            payload: payload.into(),
            endorsement: None,
        }
    }

    /// Rejected response
    #[inline]
    #[must_use]
    pub fn rejected(endorser: impl Into<String>, status: i32, message: impl Into<String>) -> Self {
        Self {
            endorser: endorser.into(),
            status,
            message: message.into(),
            payload: Vec::new(),
            endorsement: None,
        }
    }

    /// Attach endorsement
    #[inline]
    #[must_use]
    pub fn with_endorsement(mut self, endorsement: Endorsement) -> Self {
        self.endorsement = Some(endorsement);
        self
    }

    /// Whether the peer reported success
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Bytes covered by the endorser's signature: payload followed by identity
    #[must_use]
    pub fn signed_bytes(&self) -> Vec<u8> {
        let identity = self
            .endorsement
            .as_ref()
            .map_or(&[][..], |e| e.endorser.as_slice());
        let mut bytes = Vec::with_capacity(self.payload.len() + identity.len());
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(identity);
        bytes
    }
}
