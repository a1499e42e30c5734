//! Error types for qspiflash-core
//!
//! This module provides a no_std compatible error type shared by the
//! transports and the flash device model.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// The controller rejected or failed to complete an instruction
    TransferFailed,
    /// The controller never signalled the end of an instruction
    TransferTimeout,
    /// Opcode is not understood by the transport or the attached device
    OpcodeNotSupported,
    /// Requested clock frequency cannot be produced by the controller
    InvalidClock,

    // Identification errors
    /// No entry in the device table matches the JEDEC ID read from the bus
    DeviceNotFound {
        /// Manufacturer byte as read
        manufacturer: u8,
        /// Memory type byte as read
        memory_type: u8,
        /// Capacity byte as read
        capacity: u8,
    },
    /// Operation requires a successfully identified device
    NotInitialized,

    // Device errors
    /// Status register never reported ready within the poll budget
    DeviceNotResponding {
        /// Last status register value observed
        status: u8,
    },
    /// The quad-enable bit did not stick after writing the status register
    QuadEnableFailed,
    /// Flash device is write protected
    WriteProtected,

    // Address/size errors
    /// Address or range is beyond the device capacity
    AddressOutOfBounds,
    /// Sector or block index is beyond the device capacity
    SectorOutOfRange,

    // Configuration errors
    /// Option key or value could not be parsed
    InvalidOption,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferFailed => write!(f, "QSPI transfer failed"),
            Self::TransferTimeout => write!(f, "QSPI instruction did not complete"),
            Self::OpcodeNotSupported => write!(f, "opcode not supported"),
            Self::InvalidClock => write!(f, "requested QSPI clock is not achievable"),
            Self::DeviceNotFound {
                manufacturer,
                memory_type,
                capacity,
            } => write!(
                f,
                "unknown flash device (JEDEC ID {:02X} {:02X} {:02X})",
                manufacturer, memory_type, capacity
            ),
            Self::NotInitialized => write!(f, "flash device not initialized"),
            Self::DeviceNotResponding { status } => {
                write!(f, "flash device not responding (status 0x{:02X})", status)
            }
            Self::QuadEnableFailed => write!(f, "failed to enable quad mode"),
            Self::WriteProtected => write!(f, "flash device is write protected"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::SectorOutOfRange => write!(f, "sector index out of range"),
            Self::InvalidOption => write!(f, "invalid option"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
