use ed25519_dalek::{Signer, SigningKey};
use invoke_types::{Endorsement, Peer, ProposalResponse, Request};

pub fn peer(n: usize) -> Peer {
    Peer::new(format!("grpcs://peer{n}.org{n}.example.com:7051"), format!("Org{n}MSP"))
}

pub fn peers(count: usize) -> Vec<Peer> {
    (1..=count).map(peer).collect()
}

pub fn request() -> Request {
    Request::new("marbles", "transfer")
        .with_arg("marble1")
        .with_arg("bob")
}

/// Deterministic key; distinct seeds give distinct keys
pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

/// Attach an endorsement by `key` to `response`
pub fn sign_response(response: ProposalResponse, key: &SigningKey) -> ProposalResponse {
    let mut response = response.with_endorsement(Endorsement {
        endorser: key.verifying_key().to_bytes().to_vec(),
        signature: Vec::new(),
    });
    let signature = key.sign(&response.signed_bytes()).to_bytes().to_vec();
    if let Some(endorsement) = response.endorsement.as_mut() {
        endorsement.signature = signature;
    }
    response
}

/// Successful response carrying `payload`, signed by `key`
pub fn signed_response(endorser: &str, payload: &str, key: &SigningKey) -> ProposalResponse {
    sign_response(ProposalResponse::success(endorser, payload), key)
}
