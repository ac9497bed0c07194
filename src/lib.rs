//! `green-prism` library crate.
//!
//! The binary (`prism`) is a thin wrapper around this library so that:
//!
//! - session logic is testable without a terminal or a live backend
//! - the one-shot commands and the TUI share the same sessions and formatters

pub mod analytics;
pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod logging;
pub mod report;
pub mod session;
pub mod theme;
pub mod tui;
