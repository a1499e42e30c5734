//! Flash device type definitions

use core::fmt;

use super::features::Features;

/// Device name storage
///
/// Borrowed for the built-in table; owned when loaded from a RON file.
#[cfg(feature = "alloc")]
pub type DeviceName = alloc::borrow::Cow<'static, str>;

/// Device name storage
#[cfg(not(feature = "alloc"))]
pub type DeviceName = &'static str;

/// Build a [`DeviceName`] from a static string in const context
#[cfg(feature = "alloc")]
pub const fn device_name(name: &'static str) -> DeviceName {
    alloc::borrow::Cow::Borrowed(name)
}

/// Build a [`DeviceName`] from a static string in const context
#[cfg(not(feature = "alloc"))]
pub const fn device_name(name: &'static str) -> DeviceName {
    name
}

/// The three bytes returned by the JEDEC Read ID (0x9F) command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JedecId {
    /// Manufacturer byte
    pub manufacturer: u8,
    /// Memory type byte
    pub memory_type: u8,
    /// Capacity byte
    pub capacity: u8,
}

impl JedecId {
    /// Create a JEDEC ID from its three bytes
    pub const fn new(manufacturer: u8, memory_type: u8, capacity: u8) -> Self {
        Self {
            manufacturer,
            memory_type,
            capacity,
        }
    }

    /// Create a JEDEC ID from the raw response bytes
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Packed as `manufacturer << 16 | memory_type << 8 | capacity`
    pub const fn as_u32(&self) -> u32 {
        ((self.manufacturer as u32) << 16) | ((self.memory_type as u32) << 8) | self.capacity as u32
    }
}

impl fmt::Display for JedecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X}",
            self.manufacturer, self.memory_type, self.capacity
        )
    }
}

/// Which status register holds the quad-enable bit and how it is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusLayout {
    /// QE lives in SR2; WRSR (0x01) takes two bytes `[SR1, SR2]`
    #[default]
    Combined,
    /// QE lives in SR2; SR2 has its own write command WRSR2 (0x31)
    Split,
    /// Only one status register; QE lives in SR1 and WRSR takes one byte
    SingleByte,
}

impl StatusLayout {
    /// The register to read when checking the quad-enable bit
    pub const fn quad_enable_register(&self) -> StatusRegister {
        match self {
            Self::SingleByte => StatusRegister::Sr1,
            Self::Combined | Self::Split => StatusRegister::Sr2,
        }
    }
}

/// A status register index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusRegister {
    /// Status register 1 (RDSR 0x05)
    Sr1,
    /// Status register 2 (RDSR2 0x35)
    Sr2,
}

/// Static description of a QSPI NOR flash part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashDevice {
    /// Part name
    pub name: DeviceName,
    /// JEDEC ID the part answers with
    pub jedec: JedecId,
    /// Total size in bytes
    pub total_size: u32,
    /// Page program size in bytes
    pub page_size: u32,
    /// Smallest erase unit (sector erase 0x20) in bytes
    pub sector_size: u32,
    /// Block erase (0xD8) size in bytes
    pub block_size: u32,
    /// Time from power-up until the part accepts commands
    pub start_up_time_us: u16,
    /// Maximum serial clock for the commands the driver uses
    pub max_clock_speed_mhz: u8,
    /// Bit mask of the quad-enable bit, 0 if the part has none
    pub quad_enable_bit_mask: u8,
    /// Status register organisation
    pub status_layout: StatusLayout,
    /// Feature flags
    pub features: Features,
}

impl FlashDevice {
    /// Standard page size for every part in the table
    pub const PAGE_SIZE: u32 = 256;
    /// Standard sector size for every part in the table
    pub const SECTOR_SIZE: u32 = 4096;
    /// Standard block size for every part in the table
    pub const BLOCK_SIZE: u32 = 64 * 1024;

    /// Create a device with the standard 256 B page / 4 KiB sector / 64 KiB
    /// block geometry and no quad support
    pub const fn new(name: &'static str, jedec: JedecId, total_size: u32) -> Self {
        Self {
            name: device_name(name),
            jedec,
            total_size,
            page_size: Self::PAGE_SIZE,
            sector_size: Self::SECTOR_SIZE,
            block_size: Self::BLOCK_SIZE,
            start_up_time_us: 5000,
            max_clock_speed_mhz: 50,
            quad_enable_bit_mask: 0,
            status_layout: StatusLayout::Combined,
            features: Features::FAST_READ,
        }
    }

    /// Set start-up time and maximum clock
    pub const fn with_timing(mut self, start_up_time_us: u16, max_clock_speed_mhz: u8) -> Self {
        self.start_up_time_us = start_up_time_us;
        self.max_clock_speed_mhz = max_clock_speed_mhz;
        self
    }

    /// Set quad-enable mask and status register layout
    pub const fn with_quad_enable(mut self, mask: u8, layout: StatusLayout) -> Self {
        self.quad_enable_bit_mask = mask;
        self.status_layout = layout;
        self
    }

    /// Replace the feature flags
    pub const fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Check if this device matches the given JEDEC ID
    pub fn matches_jedec_id(&self, id: JedecId) -> bool {
        self.jedec == id
    }

    /// Number of erase sectors
    pub const fn sector_count(&self) -> u32 {
        self.total_size / self.sector_size
    }

    /// Number of 64 KiB blocks
    pub const fn block_count(&self) -> u32 {
        self.total_size / self.block_size
    }

    /// Check if an address range fits within the device
    pub fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        let end = addr as u64 + len as u64;
        end <= self.total_size as u64
    }

    /// True if the part has a quad-enable bit to manage
    pub const fn has_quad_enable(&self) -> bool {
        self.quad_enable_bit_mask != 0
    }

    /// True if data reads can use the quad output command
    pub fn supports_quad_read(&self) -> bool {
        self.features.contains(Features::QSPI)
    }

    /// True if page programs can use the quad page program command
    pub fn supports_quad_write(&self) -> bool {
        self.features.contains(Features::QSPI | Features::QSPI_WRITES)
    }

    /// True if the part must have its block protection cleared after reset
    pub fn has_sector_protection(&self) -> bool {
        self.features.contains(Features::SECTOR_PROTECTION)
    }

    /// Maximum serial clock in Hz
    pub const fn max_clock_hz(&self) -> u32 {
        self.max_clock_speed_mhz as u32 * 1_000_000
    }
}
