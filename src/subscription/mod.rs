//! Provides structures and traits related to subscription management.
//!
//! This module includes the `Subscriber` handle a producer emits through, the
//! `Subscription` returned to the subscribing caller, and the `Teardown` value
//! that describes how to release whatever a producer started.
pub mod subscribe;
pub mod teardown;
