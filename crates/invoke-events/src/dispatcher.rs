//! Transaction status dispatcher

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use invoke_pipeline::{BoxError, EventService, Registration};
use invoke_types::{TxStatusEvent, TxnId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;
use ulid::Ulid;

/// Dispatcher failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The transaction already has a live registration
    #[error("transaction {0} is already registered")]
    AlreadyRegistered(TxnId),

    /// The dispatcher was closed
    #[error("dispatcher is closed")]
    Closed,
}

/// Counters since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Registrations accepted
    pub registered: u64,
    /// Events handed to a listener
    pub delivered: u64,
    /// Events nobody was waiting for
    pub unmatched: u64,
    /// Registrations released before delivery
    pub unregistered: u64,
}

#[derive(Debug)]
struct Slot {
    id: Ulid,
    sender: oneshot::Sender<TxStatusEvent>,
}

/// In-process [`EventService`]
#[derive(Debug, Default)]
pub struct TxStatusDispatcher {
    registrations: DashMap<TxnId, Slot>,
    stats: Mutex<DispatchStats>,
    closed: AtomicBool,
}

impl TxStatusDispatcher {
    /// Empty dispatcher
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the outcome of `txn_id`
    ///
    /// # Errors
    /// `AlreadyRegistered` if `txn_id` has a live registration, `Closed`
    /// after [`close`](Self::close).
    pub fn register(
        &self,
        txn_id: &TxnId,
    ) -> Result<(Registration, oneshot::Receiver<TxStatusEvent>), DispatchError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DispatchError::Closed);
        }

        let registration = Registration::new(txn_id.clone());
        let (sender, receiver) = oneshot::channel();

        match self.registrations.entry(txn_id.clone()) {
            Entry::Occupied(_) => return Err(DispatchError::AlreadyRegistered(txn_id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(Slot {
                    id: registration.id(),
                    sender,
                });
            }
        }

        // close() may have cleared the map between the check above and the insert
        if self.closed.load(Ordering::SeqCst) {
            self.registrations
                .remove_if(txn_id, |_, slot| slot.id == registration.id());
            return Err(DispatchError::Closed);
        }

        self.stats.lock().registered += 1;
        tracing::debug!(%registration, "registered for tx status");
        Ok((registration, receiver))
    }

    /// Deliver `event` to its registration
    ///
    /// Returns whether a listener received it. The registration is consumed
    /// either way, so a second event for the same id is never delivered.
    pub fn publish(&self, event: TxStatusEvent) -> bool {
        let Some((_, slot)) = self.registrations.remove(&event.txn_id) else {
            self.stats.lock().unmatched += 1;
            tracing::trace!(txn_id = %event.txn_id, "no listener for tx status");
            return false;
        };

        let txn_id = event.txn_id.clone();
        let delivered = slot.sender.send(event).is_ok();
        let mut stats = self.stats.lock();
        if delivered {
            stats.delivered += 1;
        } else {
            stats.unmatched += 1;
        }
        tracing::debug!(txn_id = %txn_id, delivered, "published tx status");
        delivered
    }

    /// Publish every status of a committed block
    ///
    /// Returns how many were delivered.
    pub fn publish_block(&self, events: impl IntoIterator<Item = TxStatusEvent>) -> usize {
        events
            .into_iter()
            .map(|event| self.publish(event))
            .filter(|delivered| *delivered)
            .count()
    }

    /// Release `registration` if it still owns its transaction id
    pub fn release(&self, registration: &Registration) -> bool {
        let removed = self
            .registrations
            .remove_if(registration.txn_id(), |_, slot| slot.id == registration.id())
            .is_some();
        if removed {
            self.stats.lock().unregistered += 1;
            tracing::debug!(%registration, "unregistered tx status");
        }
        removed
    }

    /// Close the dispatcher
    ///
    /// Pending listeners see their source close without an event; later
    /// registrations fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.registrations.clear();
    }

    /// Whether [`close`](Self::close) was called
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Live registrations
    #[inline]
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Whether `txn_id` has a live registration
    #[inline]
    #[must_use]
    pub fn is_registered(&self, txn_id: &TxnId) -> bool {
        self.registrations.contains_key(txn_id)
    }

    /// Counters snapshot
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        *self.stats.lock()
    }
}

#[async_trait::async_trait]
impl EventService for TxStatusDispatcher {
    async fn register_tx_status_event(
        &self,
        txn_id: &TxnId,
    ) -> Result<(Registration, oneshot::Receiver<TxStatusEvent>), BoxError> {
        self.register(txn_id).map_err(Into::into)
    }

    fn unregister(&self, registration: Registration) {
        self.release(&registration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_types::TxValidationCode;

    fn event(id: &str, code: TxValidationCode) -> TxStatusEvent {
        TxStatusEvent::new(TxnId::from_string(id), code, 1)
    }

    #[test]
    fn duplicate_registration_rejected() {
        let dispatcher = TxStatusDispatcher::new();
        let id = TxnId::from_string("t1");
        let _first = dispatcher.register(&id).unwrap();

        let err = dispatcher.register(&id).unwrap_err();
        assert_eq!(err, DispatchError::AlreadyRegistered(id));
        assert_eq!(dispatcher.registration_count(), 1);
    }

    #[test]
    fn delivered_at_most_once() {
        let dispatcher = TxStatusDispatcher::new();
        let (_reg, mut rx) = dispatcher.register(&TxnId::from_string("t1")).unwrap();

        assert!(dispatcher.publish(event("t1", TxValidationCode::Valid)));
        assert!(!dispatcher.publish(event("t1", TxValidationCode::MvccReadConflict)));

        assert_eq!(rx.try_recv().unwrap().validation_code, TxValidationCode::Valid);
        assert_eq!(dispatcher.registration_count(), 0);
        assert_eq!(dispatcher.stats().unmatched, 1);
    }

    #[test]
    fn stale_handle_cannot_release_new_registration() {
        let dispatcher = TxStatusDispatcher::new();
        let id = TxnId::from_string("t1");
        let (old, _rx) = dispatcher.register(&id).unwrap();
        assert!(dispatcher.release(&old));

        let (_current, _rx2) = dispatcher.register(&id).unwrap();
        assert!(!dispatcher.release(&old));
        assert!(dispatcher.is_registered(&id));
    }

    #[test]
    fn dropped_receiver_is_not_delivered() {
        let dispatcher = TxStatusDispatcher::new();
        let (_reg, rx) = dispatcher.register(&TxnId::from_string("t1")).unwrap();
        drop(rx);

        assert!(!dispatcher.publish(event("t1", TxValidationCode::Valid)));
    }

    #[test]
    fn close_drops_pending_senders() {
        let dispatcher = TxStatusDispatcher::new();
        let (_reg, mut rx) = dispatcher.register(&TxnId::from_string("t1")).unwrap();

        dispatcher.close();
        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
        assert_eq!(
            dispatcher.register(&TxnId::from_string("t2")).unwrap_err(),
            DispatchError::Closed
        );
    }

    #[test]
    fn registrations_racing_close_leave_nothing_behind() {
        for round in 0..50 {
            let dispatcher = TxStatusDispatcher::new();
            std::thread::scope(|scope| {
                for worker in 0..4 {
                    let dispatcher = &dispatcher;
                    scope.spawn(move || {
                        for i in 0..64 {
                            let id = TxnId::from_string(format!("r{round}-w{worker}-{i}"));
                            let _ = dispatcher.register(&id);
                        }
                    });
                }
                scope.spawn(|| dispatcher.close());
            });

            assert!(dispatcher.is_closed());
            assert_eq!(dispatcher.registration_count(), 0);
        }
    }
}
