//! The receiving side of a stream.
//!
//! Anything that implements [`Observer`] can be handed to
//! [`Observable::subscribe`]. Only `next` is mandatory; an observer that does not
//! override `error` or `complete` simply ignores those signals.
//!
//! [`Observable::subscribe`]: crate::Observable::subscribe
use crate::StreamError;

pub trait Observer {
    type NextFnType;

    /// Receives the next emitted value.
    fn next(&mut self, _: Self::NextFnType);

    /// Receives the error that terminated the stream.
    ///
    /// Returning `Err` hands the error back, meaning this observer does not
    /// handle errors. The default implementation does exactly that, so a
    /// producer failure during `subscribe` is returned to the caller instead of
    /// being lost.
    fn error(&mut self, e: StreamError) -> Result<(), StreamError> {
        Err(e)
    }

    /// Notified once the stream completes.
    fn complete(&mut self) {}
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(StreamError) + Send>;

/// An [`Observer`] assembled from closures.
///
/// ```
/// use lazyrx::FnObserver;
///
/// let mut observer = FnObserver::on_next(|v: i32| println!("Emitted {}", v));
/// observer.on_complete(|| println!("Completed"));
/// ```
pub struct FnObserver<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
}

impl<NextFnType> FnObserver<NextFnType> {
    /// Creates an observer with handlers for all three signals.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(StreamError) + 'static + Send,
        complete_fn: impl FnMut() + 'static + Send,
    ) -> Self {
        FnObserver {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
        }
    }

    /// Creates an observer that only handles emitted values.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        FnObserver {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
        }
    }

    /// Sets the function called when the stream completes.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Sets the function called when the stream errors.
    ///
    /// Once set, producer failures during `subscribe` are routed here instead of
    /// being returned to the subscribing caller.
    pub fn on_error(&mut self, error_fn: impl FnMut(StreamError) + 'static + Send) {
        self.error_fn = Some(Box::new(error_fn));
    }
}

impl<T> Observer for FnObserver<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        (self.next_fn)(v);
    }

    fn error(&mut self, e: StreamError) -> Result<(), StreamError> {
        match &mut self.error_fn {
            Some(efn) => {
                (efn)(e);
                Ok(())
            }
            None => Err(e),
        }
    }

    fn complete(&mut self) {
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }
}
