//! QSPI I/O widths

/// Lane usage for the instruction, address and data phases
///
/// The variants are ordered the way QSPI controllers number their WIDTH
/// field, so [`IoMode::width_code`] is the raw register value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IoMode {
    /// Standard SPI: 1-1-1 (cmd, addr, data all on single line)
    #[default]
    Single,
    /// Dual Output: 1-1-2 (data phase on 2 lines)
    DualOutput,
    /// Quad Output: 1-1-4 (data phase on 4 lines)
    QuadOutput,
    /// Dual I/O: 1-2-2 (addr and data on 2 lines)
    DualIo,
    /// Quad I/O: 1-4-4 (addr and data on 4 lines)
    QuadIo,
    /// Dual command: 2-2-2 (everything on 2 lines)
    DualCmd,
    /// Quad command: 4-4-4 (everything on 4 lines)
    QuadCmd,
}

impl IoMode {
    /// Raw value of the frame WIDTH field
    pub const fn width_code(&self) -> u32 {
        match self {
            Self::Single => 0,
            Self::DualOutput => 1,
            Self::QuadOutput => 2,
            Self::DualIo => 3,
            Self::QuadIo => 4,
            Self::DualCmd => 5,
            Self::QuadCmd => 6,
        }
    }

    /// Inverse of [`IoMode::width_code`]
    pub const fn from_width_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Single),
            1 => Some(Self::DualOutput),
            2 => Some(Self::QuadOutput),
            3 => Some(Self::DualIo),
            4 => Some(Self::QuadIo),
            5 => Some(Self::DualCmd),
            6 => Some(Self::QuadCmd),
            _ => None,
        }
    }
}
