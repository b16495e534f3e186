//! `lazyrx` is a small reactive runtime built around lazy, cancellable observables.
//!
//! An [`Observable`] only describes how to produce values. Nothing happens until
//! [`subscribe`] is called, and every call runs the producer again for that
//! subscriber alone. The producer pushes values through a [`Subscriber`] handle,
//! either synchronously while `subscribe` is still running or later from a timer,
//! task or thread. The caller gets a [`Subscription`] back and can cancel it at
//! any time; cancelling runs the [`Teardown`] the producer returned exactly once
//! and silences every later emission.
//!
//! [`Promise`] is included as the opposite model: its producer runs immediately,
//! it settles once, and continuations always run on a later turn.
//!
//! # Example
//!
//! ```
//! use std::sync::{
//!     atomic::{AtomicBool, Ordering},
//!     Arc, Mutex,
//! };
//!
//! use lazyrx::{FnObserver, Observable, Subscribeable, Teardown, Unsubscribeable};
//!
//! let cleared = Arc::new(AtomicBool::new(false));
//! let cleared_c = Arc::clone(&cleared);
//!
//! let numbers = Observable::new(move |s| {
//!     s.next(1);
//!     s.next(2);
//!     let cleared = Arc::clone(&cleared_c);
//!     Teardown::from_fn(move || cleared.store(true, Ordering::SeqCst))
//! });
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_c = Arc::clone(&seen);
//! let subscription = numbers
//!     .subscribe(FnObserver::on_next(move |v| seen_c.lock().unwrap().push(v)))
//!     .unwrap();
//!
//! subscription.unsubscribe().unwrap();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! assert!(cleared.load(Ordering::SeqCst));
//! ```
//!
//! [`subscribe`]: Subscribeable::subscribe

mod errors;
mod observable;
pub mod observer;
mod promise;
pub mod subscription;

pub use errors::*;
pub use observable::Observable;
pub use observer::{FnObserver, Observer};
pub use promise::{Promise, Resolver};
pub use subscription::subscribe::{Subscribeable, Subscriber, Subscription, Unsubscribeable};
pub use subscription::teardown::Teardown;
