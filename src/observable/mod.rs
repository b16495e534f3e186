//! The `observable` module provides `Observable`, a lazy and reusable description
//! of a stream of values.

use std::{fmt, sync::Arc};

use tokio::runtime::Handle;
use tracing::trace;

use crate::{
    observer::Observer,
    subscription::{
        subscribe::{Subscribeable, Subscriber, Subscription},
        teardown::Teardown,
    },
    ObservableError, StreamError,
};


type Producer<T> = dyn Fn(Subscriber<T>) -> Result<Teardown, StreamError> + Send + Sync;

/// The `Observable` struct represents a source of values that can be observed.
///
/// An `Observable` only stores its producer function. Nothing runs until
/// `subscribe` is called, and every call to `subscribe` runs the producer again
/// with a fresh `Subscriber`, so subscriptions never share execution state.
///
/// # Example: synchronous `Observable`
///
/// Values emitted directly inside the producer are delivered before `subscribe`
/// returns.
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use lazyrx::{FnObserver, Observable, Subscribeable, Teardown};
///
/// let emit_3 = Observable::new(|s| {
///     for i in 1..=3 {
///         s.next(i);
///     }
///     s.complete();
///     Teardown::Nil
/// });
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_c = Arc::clone(&seen);
/// emit_3
///     .subscribe(FnObserver::on_next(move |v| seen_c.lock().unwrap().push(v)))
///     .unwrap();
///
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
/// ```
///
/// # Example: asynchronous `Observable` with `unsubscribe`
///
/// Emissions from a Tokio task arrive after `subscribe` returns. The returned
/// teardown aborts the task, so unsubscribing also stops the background work.
///
/// ```no_run
/// use std::time::Duration;
///
/// use lazyrx::{FnObserver, Observable, Subscribeable, Teardown, Unsubscribeable};
///
/// #[tokio::main]
/// async fn main() {
///     let interval = Observable::new(|s| {
///         let task = tokio::spawn(async move {
///             let mut i = 1;
///             loop {
///                 tokio::time::sleep(Duration::from_secs(1)).await;
///                 s.next(i);
///                 i += 1;
///             }
///         });
///         Teardown::abort(task)
///     });
///
///     let subscription = interval
///         .subscribe(FnObserver::on_next(|v| println!("Emitted {}", v)))
///         .unwrap();
///
///     tokio::time::sleep(Duration::from_secs(5)).await;
///     subscription.unsubscribe().unwrap();
/// }
/// ```
pub struct Observable<T> {
    producer: Arc<Producer<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Creates an `Observable` from a producer that cannot fail.
    ///
    /// Return `Teardown::Nil` when there is nothing to clean up.
    pub fn new(producer: impl Fn(Subscriber<T>) -> Teardown + Send + Sync + 'static) -> Self {
        Observable {
            producer: Arc::new(move |s| Ok::<_, StreamError>(producer(s))),
        }
    }

    /// Creates an `Observable` from a producer that may fail while `subscribe` is
    /// running.
    ///
    /// An `Err` from the producer ends the subscription and is delivered to the
    /// observer's error handler, or returned from `subscribe` if the observer has
    /// none.
    pub fn try_new(
        producer: impl Fn(Subscriber<T>) -> Result<Teardown, StreamError> + Send + Sync + 'static,
    ) -> Self {
        Observable {
            producer: Arc::new(producer),
        }
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe<O>(&self, observer: O) -> Result<Subscription, ObservableError>
    where
        O: Observer<NextFnType = Self::ObsType> + Send + 'static,
    {
        let subscriber = Subscriber::new(observer, Handle::try_current().ok());
        let subscription = subscriber.subscription();

        trace!("running producer");
        match (self.producer)(subscriber.clone()) {
            Ok(teardown) => subscriber.arm(teardown)?,
            Err(e) => subscriber.fail(e).map_err(ObservableError::Producer)?,
        }
        Ok(subscription)
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}
