//! End-to-end invocations against recording fakes

use invoke_pipeline::prelude::*;
use invoke_pipeline::ErrorKind;
use invoke_test_utils::{init_tracing, peer, peers, request, Call, TestNetwork};
use invoke_types::ProposalResponse;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn agreeing_endorsers_and_valid_outcome() {
    init_tracing();
    let net = TestNetwork::new();
    let targets = peers(2);
    let client = net.client(
        net.selection(Vec::new()),
        net.transactor().with_outcome(TxValidationCode::Valid),
    );

    let mut ctx = RequestContext::new(request()).with_targets(targets.clone());
    Pipeline::execute(None).run(&mut ctx, &client).await.unwrap();

    assert_eq!(ctx.response.payload, b"OK".to_vec());
    assert_eq!(ctx.response.tx_validation_code, Some(TxValidationCode::Valid));
    assert_eq!(ctx.response.responses.len(), 2);
    assert_eq!(ctx.targets, targets);
    assert_eq!(net.log.selections(), 0);
}

#[tokio::test]
async fn diverging_payload_is_a_mismatch_at_index_one() {
    let net = TestNetwork::new();
    let p2 = peer(2);
    let transactor = net
        .transactor()
        .with_response(p2.url.clone(), ProposalResponse::success(p2.url.clone(), "DIFF"))
        .with_outcome(TxValidationCode::Valid);
    let client = net.client(net.selection(Vec::new()), transactor);

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    let err = Pipeline::execute(None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::EndorsementMismatch { index: 1 }));
    assert!(err.to_string().contains("mismatch detected at index 1"));
    assert_eq!(net.log.registrations(), 0);
    assert!(ctx.response.tx_validation_code.is_none());
}

#[tokio::test]
async fn selection_failure_leaves_response_empty() {
    let net = TestNetwork::new();
    let client = net.client(
        net.selection(Vec::new()).failing("no chaincode deployed"),
        net.transactor(),
    );

    let mut ctx = RequestContext::new(request());
    let err = Pipeline::execute(None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SelectionFailure);
    assert_eq!(
        err.to_string(),
        "failed to get endorsing peers: no chaincode deployed"
    );
    assert!(ctx.response.proposal.is_none());
    assert!(ctx.response.transaction_id.is_none());
    assert!(ctx.response.responses.is_empty());
    assert_eq!(net.log.transactor_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn no_outcome_before_deadline_times_out() {
    let net = TestNetwork::new();
    let client = net.client(net.selection(Vec::new()), net.transactor());

    let options = RequestOptions::new()
        .with_targets(peers(2))
        .with_timeout(std::time::Duration::from_secs(5));
    let mut ctx = RequestContext::from_options(request(), options);
    let err = Pipeline::execute(None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::ConfirmationTimeout { .. }));
    assert_eq!(net.log.registrations(), 1);
    assert_eq!(net.log.unregistrations(), 1);
    assert_eq!(net.dispatcher.registration_count(), 0);
}

#[tokio::test]
async fn rejecting_endorser_is_named() {
    let net = TestNetwork::new();
    let p1 = peer(1);
    let transactor = net.transactor().with_response(
        p1.url.clone(),
        ProposalResponse::rejected(p1.url.clone(), 500, "access denied"),
    );
    let client = net.client(net.selection(Vec::new()), transactor);

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    let err = Pipeline::execute(None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    match err {
        InvokeError::PeerRejection {
            endorser,
            status,
            message,
        } => {
            assert_eq!(endorser, p1.url);
            assert_eq!(status, 500);
            assert_eq!(message, "access denied");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_selection_is_no_targets() {
    let net = TestNetwork::new();
    let client = net.client(net.selection(Vec::new()), net.transactor());

    let mut ctx = RequestContext::new(request());
    let err = Pipeline::query(None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::NoTargets));
    assert_eq!(net.log.selections(), 1);
    assert_eq!(net.log.transactor_calls(), 0);
}

#[tokio::test]
async fn selection_is_asked_once_for_the_requested_chaincode() {
    let net = TestNetwork::new();
    let client = net.client(net.selection(peers(3)), net.transactor());

    let mut ctx = RequestContext::new(request());
    Pipeline::query(None).run(&mut ctx, &client).await.unwrap();

    assert_eq!(
        net.log.calls()[0],
        Call::SelectEndorsers {
            chaincode_ids: vec!["marbles".to_owned()]
        }
    );
    assert_eq!(net.log.selections(), 1);
    assert_eq!(ctx.targets, peers(3));
}

#[tokio::test]
async fn query_never_commits() {
    let net = TestNetwork::new();
    let client = net.client(
        net.selection(peers(2)),
        net.transactor().with_payload("marble1:bob"),
    );

    let mut ctx = RequestContext::new(request());
    Pipeline::query(None).run(&mut ctx, &client).await.unwrap();

    assert_eq!(ctx.response.payload, b"marble1:bob".to_vec());
    assert!(ctx.response.tx_validation_code.is_none());
    assert_eq!(net.log.registrations(), 0);
    assert_eq!(
        net.log.count(|c| matches!(c, Call::SendTransaction)),
        0
    );
}

#[tokio::test]
async fn proposal_send_failure_keeps_txn_id() {
    let net = TestNetwork::new();
    let client = net.client(
        net.selection(Vec::new()),
        net.transactor().failing_send_proposal("rpc error: deadline exceeded"),
    );

    let mut ctx = RequestContext::new(request()).with_targets(peers(1));
    let err = Pipeline::execute(None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "rpc error: deadline exceeded");
    assert!(err.is_retryable());
    assert!(ctx.response.transaction_id.is_some());
}

#[tokio::test]
async fn filter_restricts_selected_endorsers() {
    let net = TestNetwork::new();
    let client = net.client(net.selection(peers(3)), net.transactor());

    let options = RequestOptions::new().with_selection_filter(|p| p.msp_id != "Org2MSP");
    let mut ctx = RequestContext::from_options(request(), options);
    Pipeline::query(None).run(&mut ctx, &client).await.unwrap();

    assert_eq!(ctx.targets, vec![peer(1), peer(3)]);
}
