//! Endorsement signature verification
//!
//! Each endorsement carries the endorser's Ed25519 public key and a
//! signature over [`ProposalResponse::signed_bytes`]. [`Ed25519Verifier`]
//! checks that signature and, when configured with a trusted key set,
//! rejects endorsers outside it.

use crate::context::RequestContext;
use crate::error::InvokeError;
use crate::provider::BoxError;
use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH};
use invoke_types::ProposalResponse;
use std::collections::HashSet;

/// Checks one endorsement
pub trait EndorsementVerifier: Send + Sync {
    /// Verify the endorsement on `response`
    ///
    /// Only called for responses that carry an endorsement.
    fn verify(&self, response: &ProposalResponse) -> Result<(), BoxError>;
}

/// Reasons an endorsement fails verification
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// Response carries no endorsement
    #[error("response carries no endorsement")]
    Missing,

    /// Endorser identity is not a public key
    #[error("endorser identity is {0} bytes, expected {PUBLIC_KEY_LENGTH}")]
    MalformedKey(usize),

    /// Public key bytes do not decode
    #[error("endorser identity is not a valid public key")]
    InvalidKey(#[source] ed25519_dalek::SignatureError),

    /// Signature bytes do not decode
    #[error("malformed signature")]
    MalformedSignature(#[source] ed25519_dalek::SignatureError),

    /// Signature does not cover the signed bytes
    #[error("signature does not match response")]
    Mismatch(#[source] ed25519_dalek::SignatureError),

    /// Key valid but not trusted
    #[error("endorser key is not trusted")]
    Untrusted,
}

/// Ed25519 verifier with an optional trusted key set
#[derive(Debug, Clone, Default)]
pub struct Ed25519Verifier {
    trusted: Option<HashSet<[u8; PUBLIC_KEY_LENGTH]>>,
}

impl Ed25519Verifier {
    /// Accept any well-formed key
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only `keys`
    #[must_use]
    pub fn with_trusted(keys: impl IntoIterator<Item = VerifyingKey>) -> Self {
        Self {
            trusted: Some(keys.into_iter().map(|k| k.to_bytes()).collect()),
        }
    }

    fn check(&self, response: &ProposalResponse) -> Result<(), SignatureError> {
        let Some(endorsement) = response.endorsement.as_ref() else {
            return Err(SignatureError::Missing);
        };

        let key_bytes: [u8; PUBLIC_KEY_LENGTH] = endorsement
            .endorser
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::MalformedKey(endorsement.endorser.len()))?;

        if let Some(trusted) = &self.trusted {
            if !trusted.contains(&key_bytes) {
                return Err(SignatureError::Untrusted);
            }
        }

        let key = VerifyingKey::from_bytes(&key_bytes).map_err(SignatureError::InvalidKey)?;
        let signature = Signature::from_slice(&endorsement.signature)
            .map_err(SignatureError::MalformedSignature)?;

        key.verify(&response.signed_bytes(), &signature)
            .map_err(SignatureError::Mismatch)
    }
}

impl EndorsementVerifier for Ed25519Verifier {
    fn verify(&self, response: &ProposalResponse) -> Result<(), BoxError> {
        self.check(response).map_err(Into::into)
    }
}

/// Verify every collected endorsement
///
/// # Errors
/// `MissingEndorsement` or `InvalidSignature` for the first response that
/// fails, in response order.
pub fn verify_signatures(
    ctx: &RequestContext,
    verifier: &dyn EndorsementVerifier,
) -> Result<(), InvokeError> {
    for response in &ctx.response.responses {
        if response.endorsement.is_none() {
            return Err(InvokeError::MissingEndorsement {
                endorser: response.endorser.clone(),
            });
        }
        verifier
            .verify(response)
            .map_err(|source| InvokeError::InvalidSignature {
                endorser: response.endorser.clone(),
                source,
            })?;
    }
    tracing::debug!(
        verified = ctx.response.responses.len(),
        "endorsement signatures verified"
    );
    Ok(())
}
