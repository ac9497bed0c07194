//! Remote data access.
//!
//! [`PrismApi`] is the seam between the sessions and the network: the TUI and
//! CLI use [`HttpApi`], tests use in-memory fakes.

pub mod client;

pub use client::{HttpApi, PrismApi};
