//! Endorsing peer identity

use serde::{Deserialize, Serialize};

/// A peer that can receive and endorse proposals
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    /// Connection URL, also used as the endorser name in responses
    pub url: String,
    /// Membership service provider the peer belongs to
    pub msp_id: String,
}

impl Peer {
    /// Create new peer
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>, msp_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            msp_id: msp_id.into(),
        }
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.url, self.msp_id)
    }
}
