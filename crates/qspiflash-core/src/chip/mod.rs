//! Flash device types and tables
//!
//! This module provides the descriptor for a QSPI flash part, the built-in
//! table of known parts and, with `std`, a RON loader for extra tables.

mod features;
mod table;
mod types;

#[cfg(feature = "std")]
mod database;

pub use features::Features;
pub use table::*;
pub use types::*;

#[cfg(feature = "std")]
pub use database::*;
