//! Signature verification inside the execute pipeline

use invoke_pipeline::prelude::*;
use invoke_pipeline::{Ed25519Verifier, ErrorKind};
use invoke_test_utils::{peer, peers, request, signing_key, Call, TestNetwork};
use invoke_types::ProposalResponse;
use std::sync::Arc;

fn signed_transactor(net: &TestNetwork) -> invoke_test_utils::FakeTransactor {
    net.transactor()
        .with_signer(peer(1).url, signing_key(1))
        .with_signer(peer(2).url, signing_key(2))
        .with_outcome(TxValidationCode::Valid)
}

#[tokio::test]
async fn signed_endorsements_commit() {
    let net = TestNetwork::new();
    let client = net.client(net.selection(Vec::new()), signed_transactor(&net));

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    Pipeline::execute_verified(Arc::new(Ed25519Verifier::new()), None)
        .run(&mut ctx, &client)
        .await
        .unwrap();

    assert_eq!(ctx.response.tx_validation_code, Some(TxValidationCode::Valid));
}

#[tokio::test]
async fn unsigned_endorsement_stops_before_commit() {
    let net = TestNetwork::new();
    let transactor = net
        .transactor()
        .with_signer(peer(1).url, signing_key(1))
        .with_outcome(TxValidationCode::Valid);
    let client = net.client(net.selection(Vec::new()), transactor);

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    let err = Pipeline::execute_verified(Arc::new(Ed25519Verifier::new()), None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::MissingEndorsement { ref endorser } if *endorser == peer(2).url));
    assert_eq!(err.kind(), ErrorKind::SignatureFailure);
    assert_eq!(net.log.registrations(), 0);
}

#[tokio::test]
async fn untrusted_endorser_rejected() {
    let net = TestNetwork::new();
    let client = net.client(net.selection(Vec::new()), signed_transactor(&net));
    let verifier = Ed25519Verifier::with_trusted([signing_key(1).verifying_key()]);

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    let err = Pipeline::execute_verified(Arc::new(verifier), None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::InvalidSignature { ref endorser, .. } if *endorser == peer(2).url));
    assert_eq!(net.log.count(|c| matches!(c, Call::SendTransaction)), 0);
}

#[tokio::test]
async fn forged_signature_rejected() {
    let net = TestNetwork::new();
    let p2 = peer(2);
    // signed by key 1 but claims key 2's identity
    let forged = {
        let genuine = invoke_test_utils::signed_response(&p2.url, "OK", &signing_key(1));
        let mut endorsement = genuine.endorsement.clone().unwrap();
        endorsement.endorser = signing_key(2).verifying_key().to_bytes().to_vec();
        ProposalResponse {
            endorsement: Some(endorsement),
            ..genuine
        }
    };
    let transactor = net
        .transactor()
        .with_signer(peer(1).url, signing_key(1))
        .with_response(p2.url.clone(), forged)
        .with_outcome(TxValidationCode::Valid);
    let client = net.client(net.selection(Vec::new()), transactor);

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    let err = Pipeline::execute_verified(Arc::new(Ed25519Verifier::new()), None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::InvalidSignature { .. }));
}

#[tokio::test]
async fn verification_after_agreement_check() {
    let net = TestNetwork::new();
    let p2 = peer(2);
    let transactor = net
        .transactor()
        .with_response(p2.url.clone(), ProposalResponse::success(p2.url.clone(), "DIFF"));
    let client = net.client(net.selection(Vec::new()), transactor);

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    let err = Pipeline::execute_verified(Arc::new(Ed25519Verifier::new()), None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::EndorsementMismatch { index: 1 }));
}
