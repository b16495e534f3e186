use std::{fmt, future::Future, pin::Pin};

use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    subscription::subscribe::{Subscription, Unsubscribeable},
    ObservableError, StreamError,
};

/// Cleanup returned by a producer and run once when its subscription ends.
///
/// Whatever the producer started (timers, spawned tasks, threads, inner
/// subscriptions) must be released here; closing the subscriber only stops
/// delivery, it does not stop work that was already scheduled.
pub enum Teardown {
    /// Nothing to release.
    Nil,

    /// Cleanup defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Cleanup that can fail. The failure is returned from `unsubscribe`.
    Fallible(Box<dyn FnOnce() -> Result<(), StreamError> + Send>),

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Asynchronous cleanup represented by a future. It is spawned onto the Tokio
    /// runtime that was current when the subscription was created.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl Teardown {
    pub fn from_fn(f: impl FnOnce() + Send + 'static) -> Self {
        Teardown::Logic(Box::new(f))
    }

    pub fn try_from_fn(f: impl FnOnce() -> Result<(), StreamError> + Send + 'static) -> Self {
        Teardown::Fallible(Box::new(f))
    }

    /// Aborts a spawned Tokio task, typically a timer or an interval loop.
    ///
    /// ```no_run
    /// use std::time::Duration;
    ///
    /// use lazyrx::{Observable, Teardown};
    ///
    /// let ticks = Observable::new(|s| {
    ///     let task = tokio::spawn(async move {
    ///         let mut i = 0;
    ///         loop {
    ///             tokio::time::sleep(Duration::from_secs(1)).await;
    ///             i += 1;
    ///             s.next(i);
    ///         }
    ///     });
    ///     Teardown::abort(task)
    /// });
    /// ```
    pub fn abort<T: Send + 'static>(task: JoinHandle<T>) -> Self {
        Teardown::Logic(Box::new(move || task.abort()))
    }

    pub(crate) fn run(self, runtime: Option<&Handle>) -> Result<(), ObservableError> {
        match self {
            Teardown::Nil => Ok(()),
            Teardown::Logic(fnc) => {
                fnc();
                Ok(())
            }
            Teardown::Fallible(fnc) => fnc().map_err(ObservableError::Teardown),
            Teardown::Wrapped(subscription) => subscription.unsubscribe(),
            Teardown::Future(future) => match runtime {
                Some(handle) => {
                    handle.spawn(future);
                    Ok(())
                }
                None => Err(ObservableError::NoRuntime),
            },
        }
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Teardown::Nil
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Teardown::Wrapped(Box::new(subscription))
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Teardown::Nil => "Nil",
            Teardown::Logic(_) => "Logic",
            Teardown::Fallible(_) => "Fallible",
            Teardown::Wrapped(_) => "Wrapped",
            Teardown::Future(_) => "Future",
        };
        f.debug_tuple("Teardown").field(&kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;

    #[test]
    fn fallible_teardown_reports_failure() {
        let t = Teardown::try_from_fn(|| Err(ObservableError::info("port busy")));
        let e = t.run(None).unwrap_err();
        assert!(matches!(e, ObservableError::Teardown(_)));
        assert_eq!(e.to_string(), "teardown failed: port busy");
    }

    #[test]
    fn future_teardown_without_runtime_fails() {
        let t = Teardown::Future(Box::pin(async {}));
        assert!(matches!(t.run(None), Err(ObservableError::NoRuntime)));
    }

    #[tokio::test]
    async fn future_teardown_is_spawned() {
        let done = Arc::new(AtomicBool::new(false));
        let done_c = Arc::clone(&done);
        let t = Teardown::Future(Box::pin(async move {
            done_c.store(true, Ordering::SeqCst);
        }));

        t.run(Some(&Handle::current())).unwrap();
        assert!(!done.load(Ordering::SeqCst));

        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_stops_task() {
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        let probe = task.abort_handle();

        Teardown::abort(task).run(None).unwrap();
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert!(probe.is_finished());
    }
}
