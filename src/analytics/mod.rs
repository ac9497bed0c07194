//! Pure derivations over session data.
//!
//! Nothing in here performs I/O or touches shared state; every function is a
//! plain computation over its arguments so the TUI and CLI can call them on
//! every redraw.

pub mod filter;
pub mod impact;
pub mod returns;

pub use filter::{DISPLAY_LIMIT, FilteredBonds, filter_bonds};
pub use impact::choose_impact;
pub use returns::{PRICE_ONLY_LABEL, Returns, compute_returns};
