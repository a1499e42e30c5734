//! Flash protocol implementations
//!
//! This module layers flash operations on top of a [`QspiTransport`]:
//! the opcode-parameterized command facade and the serial NOR sequences
//! built from it.
//!
//! [`QspiTransport`]: crate::transport::QspiTransport

mod commands;
mod nor;

pub use commands::*;
pub use nor::*;
