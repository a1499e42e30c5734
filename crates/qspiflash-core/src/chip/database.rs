//! Device database for runtime loading and lookup
//!
//! This module provides the `DeviceDatabase` type for loading device
//! definitions from RON files at runtime, for boards that carry parts the
//! built-in table does not know.

use alloc::borrow::Cow;
use alloc::format;
use alloc::{string::String, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use super::types::{FlashDevice, JedecId, StatusLayout};
use super::Features;

/// Error type for device database operations
#[derive(Debug)]
pub enum DeviceDbError {
    /// I/O error reading files
    Io(io::Error),
    /// RON parsing error
    Parse(ron::error::SpannedError),
    /// Validation error
    Validation(String),
}

impl From<io::Error> for DeviceDbError {
    fn from(e: io::Error) -> Self {
        DeviceDbError::Io(e)
    }
}

impl From<ron::error::SpannedError> for DeviceDbError {
    fn from(e: ron::error::SpannedError) -> Self {
        DeviceDbError::Parse(e)
    }
}

impl std::fmt::Display for DeviceDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceDbError::Io(e) => write!(f, "I/O error: {}", e),
            DeviceDbError::Parse(e) => write!(f, "Parse error: {}", e),
            DeviceDbError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DeviceDbError {}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
    /// Size in mebibytes (1024 * 1024 bytes)
    MiB(u32),
}

impl Size {
    /// Convert to bytes, or `None` if the result does not fit in a u32
    pub fn to_bytes(self) -> Option<u32> {
        match self {
            Size::B(n) => Some(n),
            Size::KiB(n) => n.checked_mul(1024),
            Size::MiB(n) => n.checked_mul(1024 * 1024),
        }
    }
}

/// Feature flags (RON format)
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(default)]
struct FeaturesDef {
    fast_read: bool,
    qspi: bool,
    qspi_writes: bool,
    sector_protection: bool,
}

impl From<FeaturesDef> for Features {
    fn from(def: FeaturesDef) -> Self {
        let mut f = Features::empty();
        if def.fast_read {
            f |= Features::FAST_READ;
        }
        if def.qspi {
            f |= Features::QSPI;
        }
        if def.qspi_writes {
            f |= Features::QSPI_WRITES;
        }
        if def.sector_protection {
            f |= Features::SECTOR_PROTECTION;
        }
        f
    }
}

/// Status register layout (RON format)
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
enum StatusLayoutDef {
    #[default]
    Combined,
    Split,
    SingleByte,
}

impl From<StatusLayoutDef> for StatusLayout {
    fn from(def: StatusLayoutDef) -> Self {
        match def {
            StatusLayoutDef::Combined => StatusLayout::Combined,
            StatusLayoutDef::Split => StatusLayout::Split,
            StatusLayoutDef::SingleByte => StatusLayout::SingleByte,
        }
    }
}

/// Single device definition in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct DeviceDef {
    name: String,
    memory_type: u8,
    capacity: u8,
    total_size: Size,
    #[serde(default = "default_page_size")]
    page_size: Size,
    #[serde(default = "default_sector_size")]
    sector_size: Size,
    #[serde(default = "default_block_size")]
    block_size: Size,
    #[serde(default = "default_start_up_time")]
    start_up_time_us: u16,
    max_clock_speed_mhz: u8,
    #[serde(default)]
    quad_enable_bit_mask: u8,
    #[serde(default)]
    status_layout: StatusLayoutDef,
    #[serde(default)]
    features: FeaturesDef,
}

fn default_page_size() -> Size {
    Size::B(256)
}

fn default_sector_size() -> Size {
    Size::KiB(4)
}

fn default_block_size() -> Size {
    Size::KiB(64)
}

fn default_start_up_time() -> u16 {
    5000
}

/// Vendor definition containing multiple devices
#[derive(Debug, Clone, serde::Deserialize)]
struct VendorDef {
    vendor: String,
    manufacturer_id: u8,
    devices: Vec<DeviceDef>,
}

// ============================================================================
// Device database
// ============================================================================

/// Runtime device database
///
/// Holds device definitions loaded from RON files. Lookup order is load
/// order, matching the built-in table's first-match rule.
#[derive(Debug, Clone, Default)]
pub struct DeviceDatabase {
    devices: Vec<FlashDevice>,
}

impl DeviceDatabase {
    /// Create an empty device database
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Create a database seeded with the built-in table
    #[cfg(feature = "builtin-devices")]
    pub fn with_known_devices() -> Self {
        Self {
            devices: super::KNOWN_DEVICES.to_vec(),
        }
    }

    /// Load device definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, DeviceDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load device definitions from a RON string
    pub fn load_ron(&mut self, content: &str) -> Result<usize, DeviceDbError> {
        let vendor_def: VendorDef = ron::from_str(content)?;
        let count = vendor_def.devices.len();

        for def in vendor_def.devices {
            let total_size = size_bytes(&def.name, def.total_size)?;
            let page_size = size_bytes(&def.name, def.page_size)?;
            let sector_size = size_bytes(&def.name, def.sector_size)?;
            let block_size = size_bytes(&def.name, def.block_size)?;
            let device = FlashDevice {
                name: Cow::Owned(def.name),
                jedec: JedecId::new(vendor_def.manufacturer_id, def.memory_type, def.capacity),
                total_size,
                page_size,
                sector_size,
                block_size,
                start_up_time_us: def.start_up_time_us,
                max_clock_speed_mhz: def.max_clock_speed_mhz,
                quad_enable_bit_mask: def.quad_enable_bit_mask,
                status_layout: def.status_layout.into(),
                features: def.features.into(),
            };
            validate(&device)?;
            log::debug!(
                "Loaded {} {} ({})",
                vendor_def.vendor,
                device.name,
                device.jedec
            );
            self.devices.push(device);
        }

        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, DeviceDbError> {
        let mut total = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                total += self.load_file(&path)?;
            }
        }

        Ok(total)
    }

    /// Get all devices in the database, in match order
    pub fn devices(&self) -> &[FlashDevice] {
        &self.devices
    }

    /// Get the number of devices in the database
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Find a device by its JEDEC ID
    pub fn find_by_jedec(&self, id: JedecId) -> Option<&FlashDevice> {
        super::find_by_jedec(&self.devices, id)
    }

    /// Find devices by name (case-insensitive partial match)
    pub fn find_by_name(&self, name: &str) -> Vec<&FlashDevice> {
        let name_lower = name.to_lowercase();
        self.devices
            .iter()
            .filter(|d| d.name.to_lowercase().contains(&name_lower))
            .collect()
    }
}

fn size_bytes(name: &str, size: Size) -> Result<u32, DeviceDbError> {
    size.to_bytes()
        .ok_or_else(|| DeviceDbError::Validation(format!("{}: size overflows u32", name)))
}

fn validate(device: &FlashDevice) -> Result<(), DeviceDbError> {
    let pow2 = |v: u32| v != 0 && v.is_power_of_two();
    if !pow2(device.page_size) || !pow2(device.sector_size) || !pow2(device.block_size) {
        return Err(DeviceDbError::Validation(format!(
            "{}: page, sector and block sizes must be powers of two",
            device.name
        )));
    }
    if device.total_size == 0 || device.total_size % device.block_size != 0 {
        return Err(DeviceDbError::Validation(format!(
            "{}: total size must be a nonzero multiple of the block size",
            device.name
        )));
    }
    if device.quad_enable_bit_mask.count_ones() > 1 {
        return Err(DeviceDbError::Validation(format!(
            "{}: quad enable mask must have at most one bit set",
            device.name
        )));
    }
    Ok(())
}
