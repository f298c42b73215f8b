//! Deduplication of concurrent lifecycle operations.
//!
//! Each app keeps a map from operation to the shared future of the call that
//! is currently running. Later callers attach to that future instead of
//! starting the body again. The entry is removed by the body itself once it
//! settles, so the next call after completion starts fresh.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::domain::Operation;
use crate::error::LifecycleError;

pub(crate) type Outcome = Result<(), LifecycleError>;

pub(crate) type SharedOutcome = Shared<BoxFuture<'static, Outcome>>;

/// Key of an in-flight entry.
///
/// `scope` separates calls of one operation that act on different targets,
/// e.g. waiting for two different child containers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct OperationKey {
    operation: Operation,
    scope: Option<String>,
}

impl OperationKey {
    pub(crate) fn new(operation: Operation) -> Self {
        Self {
            operation,
            scope: None,
        }
    }

    pub(crate) fn scoped(operation: Operation, scope: impl Into<String>) -> Self {
        Self {
            operation,
            scope: Some(scope.into()),
        }
    }
}

struct Pending {
    ticket: u64,
    outcome: SharedOutcome,
}

#[derive(Default)]
pub(crate) struct InFlight {
    pending: Arc<Mutex<HashMap<OperationKey, Pending>>>,
    next_ticket: AtomicU64,
}

impl InFlight {
    /// Attach to the running call for `key`, or start `body` as that call.
    ///
    /// `body` is dropped unpolled when a call is already running.
    pub(crate) fn join<F>(&self, key: OperationKey, body: F) -> SharedOutcome
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some(entry) = pending.get(&key) {
            return entry.outcome.clone();
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let map = Arc::downgrade(&self.pending);
        let entry_key = key.clone();
        let outcome = async move {
            let outcome = body.await;
            if let Some(map) = map.upgrade() {
                let mut pending = map.lock();
                if pending.get(&entry_key).is_some_and(|p| p.ticket == ticket) {
                    pending.remove(&entry_key);
                }
            }
            outcome
        }
        .boxed()
        .shared();

        pending.insert(
            key,
            Pending {
                ticket,
                outcome: outcome.clone(),
            },
        );
        outcome
    }

    /// True while a call of `operation` (any scope) is running.
    pub(crate) fn is_pending(&self, operation: Operation) -> bool {
        self.pending
            .lock()
            .keys()
            .any(|key| key.operation == operation)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;
    use crate::domain::{AppName, AppStatus};

    fn counted(calls: &Arc<AtomicUsize>, outcome: Outcome) -> impl Future<Output = Outcome> {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            outcome
        }
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_body() {
        let in_flight = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = in_flight.join(OperationKey::new(Operation::Mount), counted(&calls, Ok(())));
        let second = in_flight.join(OperationKey::new(Operation::Mount), counted(&calls, Ok(())));
        assert!(in_flight.is_pending(Operation::Mount));

        let (a, b) = futures_util::future::join(first, second).await;
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!in_flight.is_pending(Operation::Mount));
    }

    #[tokio::test]
    async fn settled_entry_is_cleared_for_next_call() {
        let in_flight = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));

        in_flight
            .join(OperationKey::new(Operation::Load), counted(&calls, Ok(())))
            .await
            .unwrap();
        in_flight
            .join(OperationKey::new(Operation::Load), counted(&calls, Ok(())))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_shared_with_every_caller() {
        let in_flight = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let failure = LifecycleError::InvalidStateTransition {
            app: AppName::new("orders"),
            operation: Operation::Unmount,
            status: AppStatus::NotMounted,
        };

        let first = in_flight.join(
            OperationKey::new(Operation::Unmount),
            counted(&calls, Err(failure.clone())),
        );
        let second = in_flight.join(
            OperationKey::new(Operation::Unmount),
            counted(&calls, Ok(())),
        );

        let (a, b) = futures_util::future::join(first, second).await;
        assert!(a.unwrap_err().is_invalid_transition());
        assert!(b.unwrap_err().is_invalid_transition());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scopes_do_not_collapse_into_each_other() {
        let in_flight = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let main = in_flight.join(
            OperationKey::scoped(Operation::WaitForChildContainer, "main"),
            counted(&calls, Ok(())),
        );
        let aside = in_flight.join(
            OperationKey::scoped(Operation::WaitForChildContainer, "aside"),
            counted(&calls, Ok(())),
        );

        let _ = futures_util::future::join(main, aside).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
