//! Flash session - runtime state for an identified device

use crate::chip::FlashDevice;

/// Lifecycle of a [`QspiFlash`](super::QspiFlash)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    /// No device has been identified
    #[default]
    Uninitialized,
    /// Reading the JEDEC ID and scanning the device table
    Identifying,
    /// Waiting for idle and resetting the device
    Resetting,
    /// Setting the quad-enable bit
    ConfiguringQuadMode,
    /// Idle and accepting commands
    Ready,
    /// An erase is in progress
    Erasing,
    /// A buffer write is in progress
    Programming,
}

impl DeviceState {
    /// Whether a device has been identified and configured
    pub const fn is_initialized(&self) -> bool {
        matches!(self, Self::Ready | Self::Erasing | Self::Programming)
    }
}

impl core::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Identifying => "identifying",
            Self::Resetting => "resetting",
            Self::ConfiguringQuadMode => "configuring quad mode",
            Self::Ready => "ready",
            Self::Erasing => "erasing",
            Self::Programming => "programming",
        };
        f.write_str(name)
    }
}

/// Runtime state held between `begin()` and `end()`
///
/// The selected device is a shared reference into the device table the
/// driver was built with.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlashSession<'d> {
    /// The identified device, if any
    pub device: Option<&'d FlashDevice>,
    /// Cursor used by the sequential read/write helpers
    pub cursor: u32,
}

impl<'d> FlashSession<'d> {
    /// Start a session for an identified device with the cursor at 0
    pub fn new(device: &'d FlashDevice) -> Self {
        Self {
            device: Some(device),
            cursor: 0,
        }
    }

    /// Get the page size, or 0 without a device
    pub fn page_size(&self) -> u32 {
        self.device.map_or(0, |d| d.page_size)
    }

    /// Get the sector size, or 0 without a device
    pub fn sector_size(&self) -> u32 {
        self.device.map_or(0, |d| d.sector_size)
    }

    /// Get the total size, or 0 without a device
    pub fn total_size(&self) -> u32 {
        self.device.map_or(0, |d| d.total_size)
    }

    /// Bytes left between the cursor and the end of the device
    pub fn remaining(&self) -> u32 {
        self.total_size().saturating_sub(self.cursor)
    }
}
