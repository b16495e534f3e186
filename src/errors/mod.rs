//! Error types shared by observables, subscriptions and promises.
mod observable_errors;

pub use observable_errors::*;
