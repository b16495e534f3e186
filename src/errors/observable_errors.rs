use std::{error::Error, sync::Arc};

/// Error value carried through streams and promises.
///
/// It is reference counted so a single outcome can be handed to every
/// continuation registered on a settled `Promise`.
pub type StreamError = Arc<dyn Error + Send + Sync>;

/// Failures surfaced by the runtime itself rather than delivered to an observer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ObservableError {
    /// The producer failed while `subscribe` was running and the observer had
    /// no error handler to take it.
    #[error("producer failed during subscribe: {0}")]
    Producer(StreamError),

    /// Teardown logic reported a failure while unsubscribing.
    #[error("teardown failed: {0}")]
    Teardown(StreamError),

    /// Asynchronous teardown was requested but the subscription was created
    /// outside of a Tokio runtime.
    #[error("asynchronous teardown requires a Tokio runtime")]
    NoRuntime,

    /// Every `Resolver` of a pending promise was dropped, so it can never
    /// settle.
    #[error("promise was abandoned before it settled")]
    Abandoned,

    /// A promise continuation panicked; its chained promise is rejected with
    /// this.
    #[error("promise continuation panicked")]
    Panicked,

    #[error("{0}")]
    Info(String),
}

impl ObservableError {
    /// Builds a `StreamError` from a plain message.
    ///
    /// ```
    /// use lazyrx::ObservableError;
    ///
    /// let e = ObservableError::info("sensor offline");
    /// assert_eq!(e.to_string(), "sensor offline");
    /// ```
    pub fn info(msg: impl Into<String>) -> StreamError {
        Arc::new(ObservableError::Info(msg.into()))
    }

    /// Returns the error reported by the producer or the teardown, if any.
    #[must_use]
    pub fn inner(&self) -> Option<&StreamError> {
        match self {
            Self::Producer(e) | Self::Teardown(e) => Some(e),
            _ => None,
        }
    }
}
