//! Core types and trait definitions for the Muster event-registration
//! platform.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the domain model, the access-control decision, the admission rules for
//! registrations, and the services that front the [`store::EventStore`]
//! boundary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod event;
pub mod gate;
pub mod invalidate;
pub mod ledger;
pub mod outcome;
pub mod registration;
pub mod registry;
pub mod roles;
pub mod store;
pub mod user;

pub use error::{Error, ErrorKind, Result};
pub use outcome::Outcome;
