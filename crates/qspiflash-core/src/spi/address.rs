//! Address width types

/// Address length programmed into the instruction frame
///
/// QSPI controllers configure the address length globally rather than per
/// instruction, so this lives with the transport and not in the descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// 3-byte (24-bit) address - supports up to 16 MiB
    #[default]
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    FourByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Returns the number of address bits
    pub const fn bits(&self) -> u8 {
        self.bytes() * 8
    }

    /// Returns the maximum addressable size in bytes
    pub const fn max_size(&self) -> u64 {
        match self {
            Self::ThreeByte => 16 * 1024 * 1024, // 16 MiB
            Self::FourByte => 1 << 32,           // 4 GiB
        }
    }

    /// Parse a width given in bits (24 or 32)
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            24 => Some(Self::ThreeByte),
            32 => Some(Self::FourByte),
            _ => None,
        }
    }
}
