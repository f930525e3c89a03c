use crate::{sign_response, Call, CallLog};
use ed25519_dalek::SigningKey;
use invoke_events::TxStatusDispatcher;
use invoke_pipeline::{
    BoxError, EventService, PeerFilter, Registration, SelectionService, Transactor,
};
use invoke_types::{
    Peer, ProposalResponse, Request, Transaction, TransactionHeader, TransactionProposal,
    TransactionRequest, TransactionResponse, TxStatusEvent, TxValidationCode, TxnId,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Selection service with a fixed answer
#[derive(Debug, Clone)]
pub struct FakeSelection {
    log: CallLog,
    result: Result<Vec<Peer>, String>,
}

impl FakeSelection {
    pub fn new(log: CallLog, endorsers: Vec<Peer>) -> Self {
        Self {
            log,
            result: Ok(endorsers),
        }
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.result = Err(message.into());
        self
    }
}

#[async_trait::async_trait]
impl SelectionService for FakeSelection {
    async fn endorsers_for_chaincode(
        &self,
        chaincode_ids: &[String],
        filter: Option<PeerFilter>,
    ) -> Result<Vec<Peer>, BoxError> {
        self.log.record(Call::SelectEndorsers {
            chaincode_ids: chaincode_ids.to_vec(),
        });
        let endorsers = self.result.clone()?;
        Ok(match filter {
            Some(filter) => endorsers.into_iter().filter(|p| filter(p)).collect(),
            None => endorsers,
        })
    }
}

/// When and what the fake ledger reports after broadcast
#[derive(Debug, Clone, Copy)]
struct Outcome {
    code: TxValidationCode,
    delay: Option<Duration>,
}

/// Transactor answering from configuration
///
/// By default every target endorses with payload `OK`, broadcast succeeds,
/// and no outcome is ever published.
#[derive(Debug, Clone)]
pub struct FakeTransactor {
    log: CallLog,
    dispatcher: Arc<TxStatusDispatcher>,
    payload: Vec<u8>,
    overrides: HashMap<String, ProposalResponse>,
    signers: HashMap<String, SigningKey>,
    send_proposal_error: Option<String>,
    create_transaction_error: Option<String>,
    send_transaction_error: Option<String>,
    outcome: Option<Outcome>,
}

impl FakeTransactor {
    pub fn new(log: CallLog, dispatcher: Arc<TxStatusDispatcher>) -> Self {
        Self {
            log,
            dispatcher,
            payload: b"OK".to_vec(),
            overrides: HashMap::new(),
            signers: HashMap::new(),
            send_proposal_error: None,
            create_transaction_error: None,
            send_transaction_error: None,
            outcome: None,
        }
    }

    /// Payload every non-overridden target endorses
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Fixed response from the peer at `url`
    pub fn with_response(mut self, url: impl Into<String>, response: ProposalResponse) -> Self {
        self.overrides.insert(url.into(), response);
        self
    }

    /// Sign responses from the peer at `url` with `key`
    pub fn with_signer(mut self, url: impl Into<String>, key: SigningKey) -> Self {
        self.signers.insert(url.into(), key);
        self
    }

    pub fn failing_send_proposal(mut self, message: impl Into<String>) -> Self {
        self.send_proposal_error = Some(message.into());
        self
    }

    pub fn failing_create_transaction(mut self, message: impl Into<String>) -> Self {
        self.create_transaction_error = Some(message.into());
        self
    }

    pub fn failing_send_transaction(mut self, message: impl Into<String>) -> Self {
        self.send_transaction_error = Some(message.into());
        self
    }

    /// Publish `code` while the broadcast call is still in progress
    pub fn with_outcome(mut self, code: TxValidationCode) -> Self {
        self.outcome = Some(Outcome { code, delay: None });
        self
    }

    /// Publish `code` `delay` after broadcast
    pub fn with_delayed_outcome(mut self, code: TxValidationCode, delay: Duration) -> Self {
        self.outcome = Some(Outcome {
            code,
            delay: Some(delay),
        });
        self
    }

    fn respond(&self, target: &Peer) -> ProposalResponse {
        let response = self
            .overrides
            .get(&target.url)
            .cloned()
            .unwrap_or_else(|| ProposalResponse::success(target.url.clone(), self.payload.clone()));
        match self.signers.get(&target.url) {
            Some(key) => sign_response(response, key),
            None => response,
        }
    }

    fn publish(&self, txn_id: TxnId, outcome: Outcome) {
        let event = TxStatusEvent::new(txn_id, outcome.code, 1).with_source("fake-peer");
        match outcome.delay {
            None => {
                self.dispatcher.publish(event);
            }
            Some(delay) => {
                let dispatcher = Arc::clone(&self.dispatcher);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    dispatcher.publish(event);
                });
            }
        }
    }
}

#[async_trait::async_trait]
impl Transactor for FakeTransactor {
    fn create_transaction_header(&self) -> Result<TransactionHeader, BoxError> {
        self.log.record(Call::CreateHeader);
        Ok(TransactionHeader::new("mychannel", b"fake-client".to_vec()))
    }

    fn create_proposal(
        &self,
        header: TransactionHeader,
        request: &Request,
    ) -> Result<TransactionProposal, BoxError> {
        self.log.record(Call::CreateProposal);
        Ok(TransactionProposal::new(header, request.clone()))
    }

    async fn send_transaction_proposal(
        &self,
        _proposal: &TransactionProposal,
        targets: &[Peer],
    ) -> Result<Vec<ProposalResponse>, BoxError> {
        self.log.record(Call::SendProposal {
            targets: targets.iter().map(|p| p.url.clone()).collect(),
        });
        if let Some(message) = &self.send_proposal_error {
            return Err(message.clone().into());
        }
        Ok(targets.iter().map(|t| self.respond(t)).collect())
    }

    fn create_transaction(&self, request: TransactionRequest) -> Result<Transaction, BoxError> {
        self.log.record(Call::CreateTransaction);
        if let Some(message) = &self.create_transaction_error {
            return Err(message.clone().into());
        }
        Ok(Transaction::from(request))
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<TransactionResponse, BoxError> {
        self.log.record(Call::SendTransaction);
        if let Some(message) = &self.send_transaction_error {
            return Err(message.clone().into());
        }
        if let Some(outcome) = self.outcome {
            self.publish(transaction.txn_id().clone(), outcome);
        }
        Ok(TransactionResponse {
            orderer: "orderer0.example.com:7050".to_owned(),
            status: 200,
        })
    }
}

/// Event service recording register/unregister around a dispatcher
#[derive(Debug, Clone)]
pub struct FakeEventService {
    log: CallLog,
    dispatcher: Arc<TxStatusDispatcher>,
    register_error: Option<String>,
}

impl FakeEventService {
    pub fn new(log: CallLog, dispatcher: Arc<TxStatusDispatcher>) -> Self {
        Self {
            log,
            dispatcher,
            register_error: None,
        }
    }

    pub fn failing_register(mut self, message: impl Into<String>) -> Self {
        self.register_error = Some(message.into());
        self
    }
}

#[async_trait::async_trait]
impl EventService for FakeEventService {
    async fn register_tx_status_event(
        &self,
        txn_id: &TxnId,
    ) -> Result<(Registration, oneshot::Receiver<TxStatusEvent>), BoxError> {
        self.log.record(Call::Register {
            txn_id: txn_id.clone(),
        });
        if let Some(message) = &self.register_error {
            return Err(message.clone().into());
        }
        self.dispatcher.register_tx_status_event(txn_id).await
    }

    fn unregister(&self, registration: Registration) {
        self.log.record(Call::Unregister {
            txn_id: registration.txn_id().clone(),
        });
        self.dispatcher.unregister(registration);
    }
}
