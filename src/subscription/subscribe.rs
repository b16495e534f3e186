use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, TryLockError,
    },
    thread::{self, ThreadId},
};

use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::{observer::Observer, subscription::teardown::Teardown, ObservableError, StreamError};

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the stream and specifies how to handle emitted values.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::Producer`] if the producer fails during the call
    /// and the observer does not handle errors.
    fn subscribe<O>(&self, observer: O) -> Result<Subscription, ObservableError>
    where
        O: Observer<NextFnType = Self::ObsType> + Send + 'static;
}

/// A trait for types that can be unsubscribed, releasing whatever the
/// subscription holds and silencing any further emissions.
pub trait Unsubscribeable {
    /// Unsubscribes and runs the teardown logic.
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns the failure reported by the teardown logic, if any.
    fn unsubscribe(&self) -> Result<(), ObservableError>;
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State every subscription has regardless of the emitted type.
struct Lifecycle {
    closed: AtomicBool,
    teardown: Mutex<Option<Teardown>>,
    runtime: Option<Handle>,
}

impl Lifecycle {
    /// Returns `true` only for the caller that actually closed it.
    fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stores the teardown returned by the producer, or runs it right away when
    /// the subscription already ended while the producer was running.
    fn arm(&self, teardown: Teardown) -> Result<(), ObservableError> {
        let mut slot = lock(&self.teardown);
        if self.is_closed() {
            drop(slot);
            return teardown.run(self.runtime.as_ref());
        }
        *slot = Some(teardown);
        Ok(())
    }

    fn run_teardown(&self) -> Result<(), ObservableError> {
        let teardown = lock(&self.teardown).take();
        match teardown {
            Some(teardown) => teardown.run(self.runtime.as_ref()),
            None => Ok(()),
        }
    }
}

type BoxedObserver<T> = Box<dyn Observer<NextFnType = T> + Send>;

/// Terminal signal raised from inside the observer's own `next`, delivered by
/// that `next` once the callback returns.
enum Terminal {
    Complete,
    Error(StreamError),
}

impl Terminal {
    fn deliver<T>(self, observer: &mut BoxedObserver<T>) -> Result<(), StreamError> {
        match self {
            Terminal::Complete => {
                observer.complete();
                Ok(())
            }
            Terminal::Error(e) => observer.error(e),
        }
    }

    fn unhandled(self) -> Result<(), StreamError> {
        match self {
            Terminal::Complete => Ok(()),
            Terminal::Error(e) => Err(e),
        }
    }
}

struct Inner<T> {
    lifecycle: Lifecycle,
    observer: Mutex<Option<BoxedObserver<T>>>,
    // Thread currently inside the observer's `next`.
    delivering: Mutex<Option<ThreadId>>,
    deferred: Mutex<Option<Terminal>>,
}

/// Type-erased view of a subscriber used by `Subscription`.
trait Control: Send + Sync {
    fn lifecycle(&self) -> &Lifecycle;
    fn release_observer(&self);
}

impl<T> Control for Inner<T> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release_observer(&self) {
        // If the lock is busy a delivery is in progress; `next` drops the
        // observer itself once it sees the closed flag.
        let released = match self.observer.try_lock() {
            Ok(mut guard) => guard.take(),
            Err(TryLockError::Poisoned(p)) => p.into_inner().take(),
            Err(TryLockError::WouldBlock) => None,
        };
        drop(released);
    }
}

/// Handle a producer uses to push signals to the subscribed observer.
///
/// A fresh `Subscriber` is created for every `subscribe` call. It is cheap to
/// clone, so a producer can keep one copy for synchronous emissions and move
/// another into a timer or task. Once the subscription ends (`complete`,
/// `error` or `unsubscribe`) every clone becomes silent.
pub struct Subscriber<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Subscriber {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Subscriber<T> {
    pub(crate) fn new(
        observer: impl Observer<NextFnType = T> + Send + 'static,
        runtime: Option<Handle>,
    ) -> Self {
        Subscriber {
            inner: Arc::new(Inner {
                lifecycle: Lifecycle {
                    closed: AtomicBool::new(false),
                    teardown: Mutex::new(None),
                    runtime,
                },
                observer: Mutex::new(Some(Box::new(observer))),
                delivering: Mutex::new(None),
                deferred: Mutex::new(None),
            }),
        }
    }

    /// Delivers `v` to the observer in the calling context.
    ///
    /// Does nothing once the subscription has ended. An emission made from
    /// inside the observer's own `next` is dropped.
    pub fn next(&self, v: T) {
        if self.is_closed() {
            trace!("emission dropped, subscriber is closed");
            return;
        }
        let Some(mut observer) = self.lock_observer() else {
            warn!("emission from inside the observer's own callback dropped");
            return;
        };
        if let Some(o) = observer.as_mut() {
            if !self.is_closed() {
                *lock(&self.inner.delivering) = Some(thread::current().id());
                o.next(v);
                *lock(&self.inner.delivering) = None;
            }
        }
        // The observer may have ended the stream from inside its own callback.
        if self.is_closed() {
            let released = observer.take();
            drop(observer);
            let deferred = lock(&self.inner.deferred).take();
            match (released, deferred) {
                (Some(mut o), Some(terminal)) => {
                    if let Err(e) = terminal.deliver(&mut o) {
                        debug!(error = %e, "stream error was not handled by the observer");
                    }
                    drop(o);
                    self.finish();
                }
                (released, _) => drop(released),
            }
        }
    }

    /// Terminates the stream with an error.
    ///
    /// The error goes to the observer's error handler and the teardown runs.
    /// An observer without an error handler ignores it.
    pub fn error(&self, e: StreamError) {
        if let Err(e) = self.fail(e) {
            debug!(error = %e, "stream error was not handled by the observer");
        }
    }

    /// Terminates the stream successfully and runs the teardown.
    pub fn complete(&self) {
        let _ = self.end(Terminal::Complete);
    }

    /// Returns `true` once the subscription has ended.
    ///
    /// Producers running background work can poll this to stop early.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lifecycle.is_closed()
    }

    /// Routes an error to the observer. `Err` means nobody took it, either
    /// because the subscription already ended or the observer has no handler.
    pub(crate) fn fail(&self, e: StreamError) -> Result<(), StreamError> {
        self.end(Terminal::Error(e))
    }

    pub(crate) fn arm(&self, teardown: Teardown) -> Result<(), ObservableError> {
        self.inner.lifecycle.arm(teardown)
    }

    pub(crate) fn subscription(&self) -> Subscription {
        Subscription {
            control: Arc::clone(&self.inner) as Arc<dyn Control>,
        }
    }

    /// Locks the observer, or returns `None` when the calling thread is
    /// already inside the observer's `next` and holds the lock itself.
    fn lock_observer(&self) -> Option<MutexGuard<'_, Option<BoxedObserver<T>>>> {
        match self.inner.observer.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
            Err(TryLockError::WouldBlock)
                if *lock(&self.inner.delivering) == Some(thread::current().id()) =>
            {
                None
            }
            Err(TryLockError::WouldBlock) => Some(lock(&self.inner.observer)),
        }
    }

    /// Closes the subscription and hands `terminal` to the observer.
    ///
    /// The observer lock is held while closing so a concurrent `next` cannot
    /// release the observer before the terminal signal is delivered. From
    /// inside the observer's own `next` the signal is parked in `deferred`
    /// and that `next` delivers it.
    fn end(&self, terminal: Terminal) -> Result<(), StreamError> {
        let Some(mut guard) = self.lock_observer() else {
            if !self.inner.lifecycle.close() {
                return terminal.unhandled();
            }
            *lock(&self.inner.deferred) = Some(terminal);
            return Ok(());
        };
        if !self.inner.lifecycle.close() {
            return terminal.unhandled();
        }
        let observer = guard.take();
        drop(guard);

        let outcome = match observer {
            Some(mut o) => terminal.deliver(&mut o),
            None => terminal.unhandled(),
        };
        self.finish();
        outcome
    }

    fn finish(&self) {
        // No caller to hand the failure to on this path.
        if let Err(e) = self.inner.lifecycle.run_teardown() {
            warn!(error = %e, "teardown failed after stream terminated");
        }
    }
}

impl<T: 'static> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        Subscriber::next(self, v);
    }

    fn error(&mut self, e: StreamError) -> Result<(), StreamError> {
        Subscriber::error(self, e);
        Ok(())
    }

    fn complete(&mut self) {
        Subscriber::complete(self);
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("closed", &self.inner.lifecycle.is_closed())
            .finish()
    }
}

/// Represents a subscription to an observable, allowing it to be cancelled.
///
/// Clones control the same subscription. Dropping a `Subscription` does not
/// unsubscribe.
#[derive(Clone)]
pub struct Subscription {
    control: Arc<dyn Control>,
}

impl Subscription {
    /// Returns `true` once unsubscribed or once the stream completed or errored.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.control.lifecycle().is_closed()
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(&self) -> Result<(), ObservableError> {
        let lifecycle = self.control.lifecycle();
        if !lifecycle.close() {
            return Ok(());
        }
        debug!("unsubscribing");
        self.control.release_observer();
        lifecycle.run_teardown()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
