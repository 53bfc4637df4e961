//! Transaction lifecycle listeners.
//!
//! The registry keeps an immutable snapshot of registered listeners behind an
//! `ArcSwap`. Registration and removal publish a new snapshot; a notification
//! pass iterates whatever snapshot was current when it started and never holds
//! a lock while user code runs.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use ledger_types::{Status, TransactionId, TransactionKind};
use thiserror::Error;
use tracing::{error, trace, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    #[error("{0}")]
    Message(String),
}

/// Observer of submitted and handled transactions. Both callbacks default to
/// doing nothing, so implementors only override what they care about.
pub trait TransactionListener: Send + Sync {
    fn transaction_submitted(
        &self,
        _kind: TransactionKind,
        _transaction_id: &TransactionId,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    fn transaction_handled(
        &self,
        _kind: TransactionKind,
        _transaction_id: &TransactionId,
        _status: Status,
    ) -> Result<(), ListenerError> {
        Ok(())
    }
}

#[derive(Clone)]
struct ListenerEntry {
    id: u64,
    listener: Arc<dyn TransactionListener>,
}

struct RegistryInner {
    entries: ArcSwap<Vec<ListenerEntry>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn remove(&self, id: u64) -> bool {
        let previous = self.entries.rcu(|current| {
            current
                .iter()
                .filter(|entry| entry.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|entry| entry.id == id)
    }
}

#[derive(Clone)]
pub struct ListenerRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: ArcSwap::from_pointee(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Adds `listener` at the end of the notification order.
    pub fn register(&self, listener: Arc<dyn TransactionListener>) -> ListenerRegistration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = ListenerEntry { id, listener };
        self.inner.entries.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(entry.clone());
            next
        });
        trace!(registration_id = id, "transaction listener registered");
        ListenerRegistration {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify_submitted(&self, kind: TransactionKind, transaction_id: &TransactionId) {
        self.dispatch("transaction_submitted", kind, transaction_id, |listener| {
            listener.transaction_submitted(kind, transaction_id)
        });
    }

    pub fn notify_handled(
        &self,
        kind: TransactionKind,
        transaction_id: &TransactionId,
        status: Status,
    ) {
        self.dispatch("transaction_handled", kind, transaction_id, |listener| {
            listener.transaction_handled(kind, transaction_id, status)
        });
    }

    fn dispatch(
        &self,
        callback: &'static str,
        kind: TransactionKind,
        transaction_id: &TransactionId,
        call: impl Fn(&dyn TransactionListener) -> Result<(), ListenerError>,
    ) {
        let snapshot = self.inner.entries.load_full();
        for entry in snapshot.iter() {
            match catch_unwind(AssertUnwindSafe(|| call(entry.listener.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(
                    callback,
                    registration_id = entry.id,
                    kind = %kind,
                    transaction_id = %transaction_id,
                    error = %err,
                    "transaction listener failed"
                ),
                Err(payload) => error!(
                    callback,
                    registration_id = entry.id,
                    kind = %kind,
                    transaction_id = %transaction_id,
                    panic = panic_message(payload.as_ref()),
                    "transaction listener panicked"
                ),
            }
        }
    }
}

/// Handle for one registration. Dropping it keeps the listener registered;
/// call `unregister` to remove it.
#[derive(Debug)]
pub struct ListenerRegistration {
    id: u64,
    registry: Weak<RegistryInner>,
}

impl ListenerRegistration {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes exactly this registration. Returns `false` if it was already
    /// gone or the owning client has been dropped.
    pub fn unregister(self) -> bool {
        self.registry
            .upgrade()
            .map(|inner| inner.remove(self.id))
            .unwrap_or(false)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use ledger_types::{AccountId, Status, Timestamp, TransactionId, TransactionKind};

    use super::{ListenerError, ListenerRegistry, TransactionListener};

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl TransactionListener for Recording {
        fn transaction_submitted(
            &self,
            kind: TransactionKind,
            _transaction_id: &TransactionId,
        ) -> Result<(), ListenerError> {
            self.events.lock().unwrap().push(format!("submitted:{kind}"));
            Ok(())
        }

        fn transaction_handled(
            &self,
            kind: TransactionKind,
            _transaction_id: &TransactionId,
            status: Status,
        ) -> Result<(), ListenerError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("handled:{kind}:{status}"));
            Ok(())
        }
    }

    struct Failing;

    impl TransactionListener for Failing {
        fn transaction_submitted(
            &self,
            _kind: TransactionKind,
            _transaction_id: &TransactionId,
        ) -> Result<(), ListenerError> {
            Err(ListenerError::Message("boom".to_string()))
        }

        fn transaction_handled(
            &self,
            _kind: TransactionKind,
            _transaction_id: &TransactionId,
            _status: Status,
        ) -> Result<(), ListenerError> {
            panic!("listener panic");
        }
    }

    fn tx_id() -> TransactionId {
        TransactionId::new(AccountId::from_num(2), Timestamp::new(1, 0))
    }

    #[test]
    fn failing_listener_does_not_stop_others() {
        let registry = ListenerRegistry::new();
        registry.register(Arc::new(Failing));
        let recording = Arc::new(Recording::default());
        registry.register(recording.clone());

        registry.notify_submitted(TransactionKind::FileCreate, &tx_id());
        registry.notify_handled(TransactionKind::FileCreate, &tx_id(), Status::Success);

        assert_eq!(
            *recording.events.lock().unwrap(),
            vec!["submitted:FILE_CREATE", "handled:FILE_CREATE:SUCCESS"]
        );
    }

    #[test]
    fn same_listener_twice_is_two_registrations() {
        let registry = ListenerRegistry::new();
        let recording = Arc::new(Recording::default());
        let first = registry.register(recording.clone());
        let second = registry.register(recording.clone());
        assert_ne!(first.id(), second.id());

        registry.notify_submitted(TransactionKind::TopicCreate, &tx_id());
        assert_eq!(recording.events.lock().unwrap().len(), 2);

        assert!(first.unregister());
        assert_eq!(registry.len(), 1);
        registry.notify_submitted(TransactionKind::TopicCreate, &tx_id());
        assert_eq!(recording.events.lock().unwrap().len(), 3);

        assert!(second.unregister());
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_during_pass_keeps_snapshot() {
        struct SelfRemoving {
            registry: ListenerRegistry,
            registration: Mutex<Option<super::ListenerRegistration>>,
            calls: Mutex<u32>,
        }

        impl TransactionListener for SelfRemoving {
            fn transaction_submitted(
                &self,
                _kind: TransactionKind,
                _transaction_id: &TransactionId,
            ) -> Result<(), ListenerError> {
                *self.calls.lock().unwrap() += 1;
                if let Some(registration) = self.registration.lock().unwrap().take() {
                    registration.unregister();
                }
                // registering mid-pass must not deadlock
                self.registry.register(Arc::new(Recording::default()));
                Ok(())
            }
        }

        let registry = ListenerRegistry::new();
        let listener = Arc::new(SelfRemoving {
            registry: registry.clone(),
            registration: Mutex::new(None),
            calls: Mutex::new(0),
        });
        let registration = registry.register(listener.clone());
        *listener.registration.lock().unwrap() = Some(registration);

        registry.notify_submitted(TransactionKind::TokenMint, &tx_id());
        assert_eq!(*listener.calls.lock().unwrap(), 1);
        // self removed, one Recording added
        assert_eq!(registry.len(), 1);
    }
}
