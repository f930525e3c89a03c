//! Commit stage ordering and cleanup

use invoke_pipeline::prelude::*;
use invoke_pipeline::{CommitStep, ErrorKind};
use invoke_test_utils::{peers, request, Call, FakeTransactor, TestNetwork};
use std::time::Duration;

async fn execute(
    net: &TestNetwork,
    transactor: FakeTransactor,
) -> (RequestContext, Option<InvokeError>) {
    let client = net.client(net.selection(Vec::new()), transactor);
    let options = RequestOptions::new()
        .with_targets(peers(2))
        .with_timeout(Duration::from_secs(5));
    let mut ctx = RequestContext::from_options(request(), options);
    let err = Pipeline::execute(None).run(&mut ctx, &client).await.err();
    (ctx, err)
}

fn assert_released_once(net: &TestNetwork) {
    assert_eq!(net.log.registrations(), 1);
    assert_eq!(net.log.unregistrations(), 1);
    assert_eq!(net.dispatcher.registration_count(), 0);
}

#[tokio::test]
async fn registration_precedes_broadcast() {
    let net = TestNetwork::new();
    let (ctx, err) = execute(&net, net.transactor().with_outcome(TxValidationCode::Valid)).await;
    assert!(err.is_none());

    let register = net
        .log
        .position(|c| matches!(c, Call::Register { .. }))
        .unwrap();
    let create = net
        .log
        .position(|c| matches!(c, Call::CreateTransaction))
        .unwrap();
    let broadcast = net
        .log
        .position(|c| matches!(c, Call::SendTransaction))
        .unwrap();
    let unregister = net
        .log
        .position(|c| matches!(c, Call::Unregister { .. }))
        .unwrap();
    assert!(register < create);
    assert!(create < broadcast);
    assert!(broadcast < unregister);

    let txn_id = ctx.response.transaction_id.unwrap();
    assert_eq!(net.log.calls()[register], Call::Register { txn_id });
}

#[tokio::test]
async fn success_releases_once() {
    let net = TestNetwork::new();
    let (_, err) = execute(&net, net.transactor().with_outcome(TxValidationCode::Valid)).await;
    assert!(err.is_none());
    assert_released_once(&net);
}

#[tokio::test]
async fn invalid_outcome_releases_once() {
    let net = TestNetwork::new();
    let (ctx, err) = execute(
        &net,
        net.transactor()
            .with_outcome(TxValidationCode::EndorsementPolicyFailure),
    )
    .await;

    let err = err.unwrap();
    assert!(matches!(
        err,
        InvokeError::InvalidOutcome {
            code: TxValidationCode::EndorsementPolicyFailure,
            ..
        }
    ));
    assert_eq!(
        ctx.response.tx_validation_code,
        Some(TxValidationCode::EndorsementPolicyFailure)
    );
    assert_released_once(&net);
}

#[tokio::test(start_paused = true)]
async fn timeout_releases_once() {
    let net = TestNetwork::new();
    let (_, err) = execute(&net, net.transactor()).await;

    assert_eq!(err.unwrap().kind(), ErrorKind::ConfirmationTimeout);
    assert_released_once(&net);
}

#[tokio::test]
async fn broadcast_failure_releases_once() {
    let net = TestNetwork::new();
    let transactor = net.transactor().failing_send_transaction("SERVICE_UNAVAILABLE");
    let (_, err) = execute(&net, transactor).await;

    let err = err.unwrap();
    assert!(matches!(
        err,
        InvokeError::CommitFailure {
            step: CommitStep::SendTransaction,
            ..
        }
    ));
    assert!(err.to_string().contains("SERVICE_UNAVAILABLE"));
    assert_released_once(&net);
}

#[tokio::test]
async fn assembly_failure_releases_once() {
    let net = TestNetwork::new();
    let transactor = net.transactor().failing_create_transaction("bad endorsements");
    let (_, err) = execute(&net, transactor).await;

    assert!(matches!(
        err.unwrap(),
        InvokeError::CommitFailure {
            step: CommitStep::CreateTransaction,
            ..
        }
    ));
    assert_eq!(net.log.count(|c| matches!(c, Call::SendTransaction)), 0);
    assert_released_once(&net);
}

#[tokio::test(start_paused = true)]
async fn late_outcome_within_deadline_is_accepted() {
    let net = TestNetwork::new();
    let (ctx, err) = execute(
        &net,
        net.transactor()
            .with_delayed_outcome(TxValidationCode::Valid, Duration::from_secs(2)),
    )
    .await;

    assert!(err.is_none());
    assert_eq!(ctx.response.tx_validation_code, Some(TxValidationCode::Valid));
    assert_released_once(&net);
}

#[tokio::test(start_paused = true)]
async fn outcome_after_deadline_is_ignored() {
    let net = TestNetwork::new();
    let (ctx, err) = execute(
        &net,
        net.transactor()
            .with_delayed_outcome(TxValidationCode::Valid, Duration::from_secs(30)),
    )
    .await;

    assert_eq!(err.unwrap().kind(), ErrorKind::ConfirmationTimeout);
    assert!(ctx.response.tx_validation_code.is_none());
    assert_released_once(&net);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(net.dispatcher.stats().delivered, 0);
    assert_eq!(net.dispatcher.stats().unmatched, 1);
}

#[tokio::test]
async fn registration_failure_never_broadcasts() {
    let net = TestNetwork::new();
    let client = net.client_with_events(
        net.selection(Vec::new()),
        net.transactor().with_outcome(TxValidationCode::Valid),
        net.events().failing_register("event hub unreachable"),
    );

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    let err = Pipeline::execute(None)
        .run(&mut ctx, &client)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RegistrationFailure);
    assert_eq!(net.log.count(|c| matches!(c, Call::SendTransaction)), 0);
    assert_eq!(net.log.unregistrations(), 0);
}

#[tokio::test]
async fn closed_dispatcher_is_not_a_verdict() {
    let net = TestNetwork::new();
    let client = net.client(net.selection(Vec::new()), net.transactor());
    let dispatcher = net.dispatcher.clone();

    let mut ctx = RequestContext::new(request()).with_targets(peers(2));
    let pipeline = Pipeline::execute(None);
    let run = pipeline.run(&mut ctx, &client);
    let closer = async {
        while dispatcher.registration_count() == 0 {
            tokio::task::yield_now().await;
        }
        dispatcher.close();
    };
    let (result, ()) = tokio::join!(run, closer);

    assert!(matches!(
        result.unwrap_err(),
        InvokeError::EventSourceClosed { .. }
    ));
    assert!(ctx.response.tx_validation_code.is_none());
    assert_eq!(net.log.unregistrations(), 1);
}

#[tokio::test]
async fn caller_cancellation_during_wait() {
    let net = TestNetwork::new();
    let client = net.client(net.selection(Vec::new()), net.transactor());
    let caller = tokio_util::sync::CancellationToken::new();
    let dispatcher = net.dispatcher.clone();

    let options = RequestOptions::new()
        .with_targets(peers(2))
        .with_cancel(caller.clone());
    let mut ctx = RequestContext::from_options(request(), options);
    let pipeline = Pipeline::execute(None);
    let run = pipeline.run(&mut ctx, &client);
    let cancel = async {
        while dispatcher.registration_count() == 0 {
            tokio::task::yield_now().await;
        }
        caller.cancel();
    };
    let (result, ()) = tokio::join!(run, cancel);

    assert!(matches!(
        result.unwrap_err(),
        InvokeError::ConfirmationTimeout { .. }
    ));
    assert_released_once(&net);
}
