//! Testing utilities for the invoke workspace
//!
//! Recording fakes of the pipeline's collaborators plus fixtures. All fakes
//! created from one [`TestNetwork`] share a [`CallLog`], so tests can assert
//! on the global order of collaborator calls.

#![allow(missing_docs)]

mod fakes;
mod fixtures;

pub use fakes::{FakeEventService, FakeSelection, FakeTransactor};
pub use fixtures::{peer, peers, request, sign_response, signed_response, signing_key};

use invoke_events::TxStatusDispatcher;
use invoke_pipeline::ClientContext;
use invoke_types::TxnId;
use parking_lot::Mutex;
use std::sync::Arc;

/// One collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SelectEndorsers { chaincode_ids: Vec<String> },
    CreateHeader,
    CreateProposal,
    SendProposal { targets: Vec<String> },
    CreateTransaction,
    SendTransaction,
    Register { txn_id: TxnId },
    Unregister { txn_id: TxnId },
}

/// Shared, ordered record of collaborator calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.lock().iter().position(pred)
    }

    pub fn selections(&self) -> usize {
        self.count(|c| matches!(c, Call::SelectEndorsers { .. }))
    }

    pub fn registrations(&self) -> usize {
        self.count(|c| matches!(c, Call::Register { .. }))
    }

    pub fn unregistrations(&self) -> usize {
        self.count(|c| matches!(c, Call::Unregister { .. }))
    }

    pub fn transactor_calls(&self) -> usize {
        self.count(|c| {
            matches!(
                c,
                Call::CreateHeader
                    | Call::CreateProposal
                    | Call::SendProposal { .. }
                    | Call::CreateTransaction
                    | Call::SendTransaction
            )
        })
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// A call log and an event dispatcher shared by a set of fakes
#[derive(Debug, Clone, Default)]
pub struct TestNetwork {
    pub log: CallLog,
    pub dispatcher: Arc<TxStatusDispatcher>,
}

impl TestNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection service returning `endorsers`
    pub fn selection(&self, endorsers: Vec<invoke_types::Peer>) -> FakeSelection {
        FakeSelection::new(self.log.clone(), endorsers)
    }

    /// Transactor publishing outcomes to this network's dispatcher
    pub fn transactor(&self) -> FakeTransactor {
        FakeTransactor::new(self.log.clone(), Arc::clone(&self.dispatcher))
    }

    /// Event service over this network's dispatcher
    pub fn events(&self) -> FakeEventService {
        FakeEventService::new(self.log.clone(), Arc::clone(&self.dispatcher))
    }

    /// Client context over `selection`, `transactor` and this network's events
    pub fn client(&self, selection: FakeSelection, transactor: FakeTransactor) -> ClientContext {
        self.client_with_events(selection, transactor, self.events())
    }

    pub fn client_with_events(
        &self,
        selection: FakeSelection,
        transactor: FakeTransactor,
        events: FakeEventService,
    ) -> ClientContext {
        ClientContext::new(Arc::new(selection), Arc::new(transactor), Arc::new(events))
    }
}

/// Route `tracing` output to the test harness; repeated calls are ignored
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
