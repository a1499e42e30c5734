//! QSPI instruction types
//!
//! This module provides the static instruction descriptors, the per-call
//! transfer requests that reference caller buffers, I/O widths and the
//! serial NOR opcodes the driver issues.

mod address;
mod instruction;
mod io_mode;
pub mod opcodes;
mod request;

pub use address::AddressWidth;
pub use instruction::{
    InstructionDescriptor, OptionCode, OptionCodeLen, TransferType, FAST_READ, PAGE_PROGRAM,
    QUAD_PAGE_PROGRAM, QUAD_READ,
};
pub use io_mode::IoMode;
pub use request::{CachePolicy, DataPhase, TransferRequest};
