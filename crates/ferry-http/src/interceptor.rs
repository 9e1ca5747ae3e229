//! Interceptor handlers and the lock gate
//!
//! An [`Interceptor`] holds an ordered list of `(fulfilled, rejected)` handler
//! pairs plus a lock gate. Removing a handler tombstones its slot, so every
//! [`HandlerId`] stays valid and is never reused.
//!
//! The gate is a single-shot broadcast signal. [`Interceptor::lock`] creates
//! it, [`Interceptor::unlock`] resolves it and [`Interceptor::clear`] rejects
//! it; every handler suspended on it observes the outcome.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::Error;

/// Reason used by [`Interceptor::clear`] when none is given
pub const DEFAULT_CLEAR_REASON: &str = "cancel";

/// Stable handle of a registered handler pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Registration index
    pub fn index(&self) -> usize {
        self.0
    }
}

type FulfilledFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T, Error>> + Send + Sync>;
type RejectedFn<T> = Arc<dyn Fn(Error) -> BoxFuture<'static, Result<T, Error>> + Send + Sync>;

/// Outcome of the lock signal: `Err` carries the clear reason
type LockSignal = Shared<BoxFuture<'static, Result<(), String>>>;

pub(crate) struct Handler<T> {
    fulfilled: FulfilledFn<T>,
    rejected: Option<RejectedFn<T>>,
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            fulfilled: self.fulfilled.clone(),
            rejected: self.rejected.clone(),
        }
    }
}

struct Slot<T> {
    handler: Handler<T>,
    active: bool,
}

#[derive(Default)]
struct LockGate {
    release: Option<oneshot::Sender<Result<(), String>>>,
    signal: Option<LockSignal>,
}

struct Inner<T> {
    slots: Mutex<Vec<Slot<T>>>,
    gate: Mutex<LockGate>,
}

/// Ordered handlers for one side of the exchange plus its lock gate
///
/// Cloning yields another handle to the same handlers and gate.
pub struct Interceptor<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Interceptor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Interceptor<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(Vec::new()),
                gate: Mutex::new(LockGate::default()),
            }),
        }
    }
}

impl<T> fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("handlers", &self.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl<T> Interceptor<T> {
    /// Create an interceptor without handlers
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, handler: Handler<T>) -> HandlerId {
        let mut slots = self.inner.slots.lock();
        slots.push(Slot {
            handler,
            active: true,
        });
        HandlerId(slots.len() - 1)
    }

    /// Remove a handler pair. Other handles are unaffected and `id` is never reused.
    ///
    /// Exchanges already in flight keep the handlers they captured when they started.
    pub fn eject(&self, id: HandlerId) {
        if let Some(slot) = self.inner.slots.lock().get_mut(id.0) {
            if slot.active {
                tracing::debug!("Ejecting interceptor handler {}", id.0);
            }
            slot.active = false;
        }
    }

    /// Number of live handler pairs
    pub fn len(&self) -> usize {
        self.inner.slots.lock().iter().filter(|s| s.active).count()
    }

    /// Whether no live handler is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live handlers in registration order
    pub(crate) fn snapshot(&self) -> Vec<Handler<T>> {
        self.inner
            .slots
            .lock()
            .iter()
            .filter(|slot| slot.active)
            .map(|slot| slot.handler.clone())
            .collect()
    }

    /// Suspend every lock-aware handler until [`Interceptor::unlock`] or
    /// [`Interceptor::clear`]. No-op while already locked.
    pub fn lock(&self) {
        let mut gate = self.inner.gate.lock();
        if gate.release.is_some() {
            return;
        }
        let (tx, rx) = oneshot::channel::<Result<(), String>>();
        let signal = rx
            .map(|outcome| match outcome {
                Ok(outcome) => outcome,
                Err(_) => Err(DEFAULT_CLEAR_REASON.to_string()),
            })
            .boxed()
            .shared();
        gate.release = Some(tx);
        gate.signal = Some(signal);
        tracing::debug!("Interceptor locked");
    }

    /// Release the lock; suspended handlers proceed with their input
    pub fn unlock(&self) {
        let mut gate = self.inner.gate.lock();
        if let Some(release) = gate.release.take() {
            gate.signal = None;
            let _ = release.send(Ok(()));
            tracing::debug!("Interceptor unlocked");
        }
    }

    /// Release the lock by rejecting every suspended handler with `reason`
    /// (default "cancel"). In-flight transport calls are not aborted.
    pub fn clear(&self, reason: Option<&str>) {
        let mut gate = self.inner.gate.lock();
        if let Some(release) = gate.release.take() {
            gate.signal = None;
            let reason = reason.unwrap_or(DEFAULT_CLEAR_REASON).to_string();
            tracing::debug!("Interceptor lock cleared: {}", reason);
            let _ = release.send(Err(reason));
        }
    }

    /// Whether a lock is held
    pub fn is_locked(&self) -> bool {
        self.inner.gate.lock().release.is_some()
    }

    fn pending_signal(&self) -> Option<LockSignal> {
        self.inner.gate.lock().signal.clone()
    }
}

impl<T: Send + 'static> Interceptor<T> {
    /// Register a fulfilled handler without a rejection handler
    pub fn use_fulfilled<F, Fut>(&self, fulfilled: F) -> HandlerId
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        self.push(Handler {
            fulfilled: Arc::new(move |value| fulfilled(value).boxed()),
            rejected: None,
        })
    }

    /// Register a handler pair. `rejected` receives the error of any earlier
    /// link and may recover by returning a value.
    pub fn use_handler<F, Fut, R, RFut>(&self, fulfilled: F, rejected: R) -> HandlerId
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
        R: Fn(Error) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        self.push(Handler {
            fulfilled: Arc::new(move |value| fulfilled(value).boxed()),
            rejected: Some(Arc::new(move |error| rejected(error).boxed())),
        })
    }

    /// Thread `state` through `handlers` in order.
    ///
    /// An `Ok` value goes to the next fulfilled handler; an `Err` goes to the
    /// next registered rejected handler and skips pairs that have none. When
    /// `wait_lock` holds, each invocation first waits on the gate as it is at
    /// that moment; a cleared gate diverts the pair to its rejected handler
    /// with [`Error::LockCleared`].
    pub(crate) async fn run_chain(
        &self,
        handlers: Vec<Handler<T>>,
        mut state: Result<T, Error>,
        wait_lock: bool,
    ) -> Result<T, Error> {
        for handler in handlers {
            state = self.run_step(&handler, state, wait_lock).await;
        }
        state
    }

    async fn run_step(
        &self,
        handler: &Handler<T>,
        state: Result<T, Error>,
        wait_lock: bool,
    ) -> Result<T, Error> {
        if state.is_err() && handler.rejected.is_none() {
            return state;
        }

        if wait_lock {
            if let Some(signal) = self.pending_signal() {
                if let Err(reason) = signal.await {
                    let cleared = Error::LockCleared(reason);
                    return match &handler.rejected {
                        Some(rejected) => rejected(cleared).await,
                        None => Err(cleared),
                    };
                }
            }
        }

        match (state, &handler.rejected) {
            (Ok(value), _) => (handler.fulfilled)(value).await,
            (Err(error), Some(rejected)) => rejected(error).await,
            (Err(error), None) => Err(error),
        }
    }
}
