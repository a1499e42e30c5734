//! Instruction descriptors
//!
//! An [`InstructionDescriptor`] is the static shape of one QSPI instruction:
//! which phases are present, how many lanes they use and which way data
//! moves. Descriptors carry no buffers and no addresses, so most of them are
//! `const` values; [`TransferRequest`](super::TransferRequest) pairs one with
//! the per-call address and data.

use super::{opcodes, IoMode};

/// Direction and addressing model of an instruction's data phase
///
/// The `*Memory` variants move data through the controller's linear
/// memory-mapped window instead of register-style accesses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransferType {
    /// Register-style read (status, ID)
    #[default]
    Read,
    /// Read through the memory-mapped window
    ReadMemory,
    /// Register-style write (status register)
    Write,
    /// Write through the memory-mapped window (page program)
    WriteMemory,
}

impl TransferType {
    /// Raw value of the frame TFRTYPE field
    pub const fn code(&self) -> u32 {
        match self {
            Self::Read => 0,
            Self::ReadMemory => 1,
            Self::Write => 2,
            Self::WriteMemory => 3,
        }
    }

    /// Inverse of [`TransferType::code`]
    pub const fn from_code(code: u32) -> Self {
        match code & 0x3 {
            0 => Self::Read,
            1 => Self::ReadMemory,
            2 => Self::Write,
            _ => Self::WriteMemory,
        }
    }

    /// True when data flows from the device to the host
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read | Self::ReadMemory)
    }

    /// True for the memory-mapped variants
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::ReadMemory | Self::WriteMemory)
    }
}

/// Length of the option code (mode bits) sent after the address
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OptionCodeLen {
    /// 1 bit
    One,
    /// 2 bits
    Two,
    /// 4 bits
    Four,
    /// 8 bits
    #[default]
    Eight,
}

impl OptionCodeLen {
    /// Raw value of the frame OPTCODELEN field
    pub const fn code(&self) -> u32 {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Four => 2,
            Self::Eight => 3,
        }
    }
}

/// Option code (continuous read mode bits) sent after the address phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OptionCode {
    /// Value of the option code
    pub value: u8,
    /// Number of option code bits on the wire
    pub len: OptionCodeLen,
}

/// Static description of one QSPI instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstructionDescriptor {
    /// The opcode byte
    pub opcode: u8,
    /// Whether an address phase follows the opcode
    pub has_address: bool,
    /// Whether a data phase follows the address/dummy phases
    pub has_data: bool,
    /// Number of dummy cycles before the data phase (0..=31)
    pub dummy_cycles: u8,
    /// Lane usage
    pub io_mode: IoMode,
    /// Data direction and addressing model
    pub transfer: TransferType,
    /// Keep the device in continuous read mode after this instruction
    pub continuous_read: bool,
    /// Optional mode bits sent after the address
    pub option_code: Option<OptionCode>,
}

impl InstructionDescriptor {
    /// An opcode-only instruction (e.g., WREN, RSTEN, chip erase)
    pub const fn command(opcode: u8) -> Self {
        Self {
            opcode,
            has_address: false,
            has_data: false,
            dummy_cycles: 0,
            io_mode: IoMode::Single,
            transfer: TransferType::Read,
            continuous_read: false,
            option_code: None,
        }
    }

    /// An opcode followed by a register-style data phase (e.g., RDSR, RDID)
    ///
    /// The transfer type is [`TransferType::Read`]; the frame encoder turns it
    /// into a write when the request carries transmit data.
    pub const fn register(opcode: u8) -> Self {
        Self {
            has_data: true,
            ..Self::command(opcode)
        }
    }

    /// An opcode followed by a register-style write (e.g., WRSR)
    pub const fn register_write(opcode: u8) -> Self {
        Self {
            has_data: true,
            transfer: TransferType::Write,
            ..Self::command(opcode)
        }
    }

    /// An opcode followed by an address and nothing else (e.g., sector erase)
    pub const fn erase(opcode: u8) -> Self {
        Self {
            has_address: true,
            transfer: TransferType::Write,
            ..Self::command(opcode)
        }
    }

    /// A memory-mapped read with address, dummy cycles and data
    pub const fn memory_read(opcode: u8, io_mode: IoMode, dummy_cycles: u8) -> Self {
        Self {
            opcode,
            has_address: true,
            has_data: true,
            dummy_cycles,
            io_mode,
            transfer: TransferType::ReadMemory,
            continuous_read: false,
            option_code: None,
        }
    }

    /// A memory-mapped write with address and data (page program)
    pub const fn memory_write(opcode: u8, io_mode: IoMode) -> Self {
        Self {
            opcode,
            has_address: true,
            has_data: true,
            dummy_cycles: 0,
            io_mode,
            transfer: TransferType::WriteMemory,
            continuous_read: false,
            option_code: None,
        }
    }

    /// Set the I/O mode for this instruction
    pub const fn with_io_mode(mut self, io_mode: IoMode) -> Self {
        self.io_mode = io_mode;
        self
    }

    /// Set the number of dummy cycles
    pub const fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Enable continuous read mode
    pub const fn with_continuous_read(mut self) -> Self {
        self.continuous_read = true;
        self
    }

    /// Attach an option code sent after the address
    pub const fn with_option_code(mut self, value: u8, len: OptionCodeLen) -> Self {
        self.option_code = Some(OptionCode { value, len });
        self
    }
}

// ============================================================================
// Memory access instructions
// ============================================================================

/// Quad Output Read (0x6B): 1-1-4, 8 dummy cycles
pub const QUAD_READ: InstructionDescriptor = InstructionDescriptor::memory_read(
    opcodes::QOR,
    IoMode::QuadOutput,
    opcodes::READ_DUMMY_CYCLES,
);

/// Fast Read (0x0B): 1-1-1, 8 dummy cycles
pub const FAST_READ: InstructionDescriptor = InstructionDescriptor::memory_read(
    opcodes::FAST_READ,
    IoMode::Single,
    opcodes::READ_DUMMY_CYCLES,
);

/// Quad Page Program (0x32): 1-1-4
pub const QUAD_PAGE_PROGRAM: InstructionDescriptor =
    InstructionDescriptor::memory_write(opcodes::QPP, IoMode::QuadOutput);

/// Page Program (0x02): 1-1-1
pub const PAGE_PROGRAM: InstructionDescriptor =
    InstructionDescriptor::memory_write(opcodes::PP, IoMode::Single);
