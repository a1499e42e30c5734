//! Serial NOR flash opcodes used by the QSPI driver
//!
//! Only the commands the driver issues are listed here; all of them are
//! common across the GigaDevice, Winbond, Spansion and Macronix parts in the
//! device table.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Status Register 3
pub const RDSR3: u8 = 0x15;
/// Write Status Register (one or two bytes depending on the part)
pub const WRSR: u8 = 0x01;
/// Write Status Register 2
pub const WRSR2: u8 = 0x31;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer, memory type, capacity)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read commands
// ============================================================================

/// Read Data (no dummy cycles, low frequency)
pub const READ: u8 = 0x03;
/// Fast Read (8 dummy cycles)
pub const FAST_READ: u8 = 0x0B;
/// Quad Output Read (1-1-4, 8 dummy cycles)
pub const QOR: u8 = 0x6B;

// ============================================================================
// Page Program
// ============================================================================

/// Page Program
pub const PP: u8 = 0x02;
/// Quad Page Program (1-1-4)
pub const QPP: u8 = 0x32;

// ============================================================================
// Erase commands
// ============================================================================

/// Sector Erase 4KB
pub const SE_20: u8 = 0x20;
/// Block Erase 32KB
pub const BE_52: u8 = 0x52;
/// Block Erase 64KB
pub const BE_D8: u8 = 0xD8;
/// Chip Erase (entire chip)
pub const CE_60: u8 = 0x60;
/// Chip Erase (alternate opcode)
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Reset
// ============================================================================

/// Enable Reset
pub const RSTEN: u8 = 0x66;
/// Reset Device
pub const RST: u8 = 0x99;

// ============================================================================
// Status register bits
// ============================================================================

/// SR1: Write In Progress
pub const SR1_WIP: u8 = 1 << 0;
/// SR1: Write Enable Latch
pub const SR1_WEL: u8 = 1 << 1;
/// SR2: Quad Enable on most parts
pub const SR2_QE: u8 = 1 << 1;
/// SR2: Erase/program suspended
pub const SR2_SUS: u8 = 1 << 7;

// ============================================================================
// Timing
// ============================================================================

/// Dummy cycles for FAST_READ and QOR
pub const READ_DUMMY_CYCLES: u8 = 8;
