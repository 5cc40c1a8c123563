//! Core types and components for the Rollbook attendance tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::RollStore`]; every component here is generic
//! over that trait and evaluates each request from scratch.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod attendance;
pub mod cleanup;
pub mod enrollment;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod page;
pub mod service;
pub mod stats;
pub mod store;
pub mod stream;
pub mod user;

pub use error::{Error, Result};
pub use service::Rollbook;
