//! Flash device feature flags

use bitflags::bitflags;

bitflags! {
    /// Feature flags for QSPI flash devices
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        /// Supports Fast Read (0x0B)
        const FAST_READ         = 1 << 0;
        /// Supports quad output reads (0x6B)
        const QSPI              = 1 << 1;
        /// Supports quad page program (0x32)
        const QSPI_WRITES       = 1 << 2;
        /// Powers up with block protection set; cleared by writing SR1 = 0
        const SECTOR_PROTECTION = 1 << 3;

        /// Shorthand for a part with full quad support
        const QUAD = Self::FAST_READ.bits() | Self::QSPI.bits() | Self::QSPI_WRITES.bits();
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::empty()
    }
}
