//! Error types for the SAMD51 QSPI transport

use thiserror::Error;

/// SAMD51 QSPI specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SamdQspiError {
    /// INSTREND never went high
    #[error("instruction 0x{opcode:02X} did not complete after {polls} polls")]
    InstructionTimeout {
        /// Opcode of the stuck instruction
        opcode: u8,
        /// Polls spent waiting
        polls: u32,
    },

    /// The cache controller never reported itself disabled
    #[error("CMCC still enabled after {polls} polls")]
    CacheTimeout {
        /// Polls spent waiting
        polls: u32,
    },

    /// The requested clock cannot be derived from the main clock
    #[error("cannot derive {hz} Hz from a {mck_hz} Hz main clock")]
    InvalidClock {
        /// Requested frequency
        hz: u32,
        /// Main clock frequency
        mck_hz: u32,
    },

    /// The transfer does not fit in the memory-mapped window
    #[error("transfer of {len} bytes at 0x{address:08X} is outside the QSPI window")]
    AddressOutOfWindow {
        /// Start address
        address: u32,
        /// Transfer length
        len: usize,
    },

    /// Option key or value could not be parsed
    #[error("invalid option: {0}")]
    InvalidOption(&'static str),
}

impl From<SamdQspiError> for qspiflash_core::Error {
    fn from(e: SamdQspiError) -> Self {
        match e {
            SamdQspiError::InstructionTimeout { .. } | SamdQspiError::CacheTimeout { .. } => {
                qspiflash_core::Error::TransferTimeout
            }
            SamdQspiError::InvalidClock { .. } => qspiflash_core::Error::InvalidClock,
            SamdQspiError::AddressOutOfWindow { .. } => qspiflash_core::Error::AddressOutOfBounds,
            SamdQspiError::InvalidOption(_) => qspiflash_core::Error::InvalidOption,
        }
    }
}

/// Result type for SAMD51 QSPI operations
pub type Result<T> = core::result::Result<T, SamdQspiError>;
