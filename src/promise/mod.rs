//! An eager, settle-once single value.
//!
//! `Promise` is the counterpart of [`Observable`]: its producer runs immediately
//! inside the constructor, it settles at most once, and every continuation runs
//! on a later turn, even when the promise had already settled by the time the
//! continuation was registered. It exists mainly as a baseline to contrast
//! with the lazy, synchronous and repeatable delivery of observables.
//!
//! [`Observable`]: crate::Observable
mod scheduler;

use std::{
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::{subscription::subscribe::lock, ObservableError, StreamError};
use scheduler::{Job, Scheduler};

type Outcome<T> = Result<T, StreamError>;
type Continuation<T> = Box<dyn FnOnce(Outcome<T>) + Send>;

enum State<T> {
    Pending(Vec<Continuation<T>>),
    Fulfilled(T),
    Rejected(StreamError),
}

struct Shared<T> {
    state: std::sync::Mutex<State<T>>,
    scheduler: Scheduler,
    // Live `Resolver`s. Once it drops to zero a pending promise can never
    // settle and its continuations are dropped.
    resolvers: AtomicUsize,
}

/// A single value that is produced eagerly and delivered asynchronously.
///
/// ```
/// use lazyrx::Promise;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let doubled = Promise::new(|r| {
///     // Runs right here, before `new` returns.
///     r.resolve(21);
/// })
/// .then(|v| v * 2);
///
/// assert_eq!(doubled.value().await.unwrap(), 42);
/// # }
/// ```
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Settles the `Promise` it was handed out by. The first settlement wins.
pub struct Resolver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Resolver<T> {
    fn new(shared: &Arc<Shared<T>>) -> Self {
        shared.resolvers.fetch_add(1, Ordering::AcqRel);
        Resolver {
            shared: Arc::clone(shared),
        }
    }
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Resolver::new(&self.shared)
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        let mut state = lock(&self.shared.state);
        if self.shared.resolvers.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let State::Pending(queue) = &mut *state else {
            return;
        };
        let abandoned = std::mem::take(queue);
        drop(state);
        if !abandoned.is_empty() {
            debug!(
                continuations = abandoned.len(),
                "promise abandoned while pending"
            );
        }
    }
}

/// Runs a continuation and settles `resolver` with its result. A panic rejects
/// the chained promise instead of leaving it pending.
fn settle_with<U: Clone + Send + 'static>(resolver: &Resolver<U>, f: impl FnOnce() -> U) {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => {
            resolver.resolve(v);
        }
        Err(_) => {
            resolver.reject(Arc::new(ObservableError::Panicked));
        }
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Creates a promise and runs `producer` immediately.
    ///
    /// The `Resolver` can be kept and used later, from any thread or task.
    pub fn new(producer: impl FnOnce(Resolver<T>)) -> Self {
        let shared = Arc::new(Shared {
            state: std::sync::Mutex::new(State::Pending(Vec::new())),
            scheduler: Scheduler::current(),
            resolvers: AtomicUsize::new(0),
        });
        trace!("running promise producer");
        producer(Resolver::new(&shared));
        Promise { shared }
    }

    /// Like [`Promise::new`], but an `Err` from `producer` rejects the promise
    /// unless it has already settled.
    pub fn try_new(producer: impl FnOnce(Resolver<T>) -> Result<(), StreamError>) -> Self {
        Promise::new(|resolver| {
            if let Err(e) = producer(resolver.clone()) {
                resolver.reject(e);
            }
        })
    }

    pub fn resolved(v: T) -> Self {
        Promise::new(|r| {
            r.resolve(v);
        })
    }

    pub fn rejected(e: StreamError) -> Self {
        Promise::new(|r| {
            r.reject(e);
        })
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(*lock(&self.shared.state), State::Pending(_))
    }

    /// Registers a pair of continuations, one of which runs once the promise
    /// settles.
    ///
    /// The continuation never runs inside this call. The returned promise
    /// settles with whatever the continuation returns, or is rejected with
    /// [`ObservableError::Panicked`] if it panics.
    pub fn on_settled<U, F, E>(&self, on_value: F, on_error: E) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
        E: FnOnce(StreamError) -> U + Send + 'static,
    {
        Promise::new(|resolver| {
            self.register(Box::new(move |outcome: Outcome<T>| {
                settle_with(&resolver, move || match outcome {
                    Ok(v) => on_value(v),
                    Err(e) => on_error(e),
                });
            }));
        })
    }

    /// Registers a continuation for the value only. A rejection is passed on
    /// to the returned promise untouched.
    pub fn then<U, F>(&self, on_value: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Promise::new(|resolver| {
            self.register(Box::new(move |outcome: Outcome<T>| match outcome {
                Ok(v) => settle_with(&resolver, move || on_value(v)),
                Err(e) => {
                    resolver.reject(e);
                }
            }));
        })
    }

    /// Waits for the outcome.
    ///
    /// # Errors
    ///
    /// Returns the rejection error, or [`ObservableError::Abandoned`] if the
    /// promise can no longer settle because every `Resolver` was dropped.
    pub async fn value(&self) -> Result<T, StreamError> {
        let (tx, rx) = oneshot::channel();
        self.register(Box::new(move |outcome: Outcome<T>| {
            let _ = tx.send(outcome);
        }));
        rx.await
            .unwrap_or_else(|_| Err(Arc::new(ObservableError::Abandoned) as StreamError))
    }

    // Deferring while the state lock is held keeps a late registration behind
    // the continuations queued before settlement.
    fn register(&self, continuation: Continuation<T>) {
        let mut state = lock(&self.shared.state);
        if matches!(*state, State::Pending(_)) && self.shared.resolvers.load(Ordering::Acquire) == 0
        {
            drop(state);
            debug!("promise can no longer settle, dropping continuation");
            drop(continuation);
            return;
        }
        let outcome = match &mut *state {
            State::Pending(queue) => {
                queue.push(continuation);
                return;
            }
            State::Fulfilled(v) => Ok(v.clone()),
            State::Rejected(e) => Err(Arc::clone(e)),
        };
        let job: Job = Box::new(move || continuation(outcome));
        self.shared.scheduler.defer([job]);
    }
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Fulfills the promise. Returns `false` if it had already settled.
    pub fn resolve(&self, v: T) -> bool {
        self.settle(Ok(v))
    }

    /// Rejects the promise. Returns `false` if it had already settled.
    pub fn reject(&self, e: StreamError) -> bool {
        self.settle(Err(e))
    }

    fn settle(&self, outcome: Outcome<T>) -> bool {
        let mut state = lock(&self.shared.state);
        let State::Pending(queue) = &mut *state else {
            debug!("promise already settled, ignoring settlement");
            return false;
        };
        let queue = std::mem::take(queue);
        *state = match &outcome {
            Ok(v) => State::Fulfilled(v.clone()),
            Err(e) => State::Rejected(Arc::clone(e)),
        };

        self.shared.scheduler.defer(queue.into_iter().map(|continuation| {
            let outcome = outcome.clone();
            Box::new(move || continuation(outcome)) as Job
        }));
        true
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *lock(&self.shared.state) {
            State::Pending(_) => "pending",
            State::Fulfilled(_) => "fulfilled",
            State::Rejected(_) => "rejected",
        };
        f.debug_struct("Promise").field("state", &state).finish()
    }
}
