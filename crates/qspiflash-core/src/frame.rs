//! Instruction frame encoder
//!
//! Translates an [`InstructionDescriptor`] into the 32-bit instruction frame
//! word of a QSPI controller. The layout follows the SAMD5x/E5x INSTRFRAME
//! register, which other memory-mapped QSPI controllers mirror closely:
//!
//! | Bits  | Field      |
//! |-------|------------|
//! | 2:0   | WIDTH      |
//! | 4     | INSTREN    |
//! | 5     | ADDREN     |
//! | 6     | OPTCODEEN  |
//! | 7     | DATAEN     |
//! | 9:8   | OPTCODELEN |
//! | 10    | ADDRLEN    |
//! | 13:12 | TFRTYPE    |
//! | 14    | CRMODE     |
//! | 15    | DDREN      |
//! | 20:16 | DUMMYLEN   |

use core::fmt;

use crate::spi::{AddressWidth, InstructionDescriptor, IoMode, TransferRequest, TransferType};

/// Frame register bit definitions
pub mod bits {
    /// I/O width field mask
    pub const WIDTH_MASK: u32 = 0x7;
    /// Instruction phase enable
    pub const INSTREN: u32 = 1 << 4;
    /// Address phase enable
    pub const ADDREN: u32 = 1 << 5;
    /// Option code phase enable
    pub const OPTCODEEN: u32 = 1 << 6;
    /// Data phase enable
    pub const DATAEN: u32 = 1 << 7;
    /// Option code length field shift
    pub const OPTCODELEN_SHIFT: u32 = 8;
    /// Option code length field mask
    pub const OPTCODELEN_MASK: u32 = 0x3 << OPTCODELEN_SHIFT;
    /// 32-bit address length
    pub const ADDRLEN_32: u32 = 1 << 10;
    /// Transfer type field shift
    pub const TFRTYPE_SHIFT: u32 = 12;
    /// Transfer type field mask
    pub const TFRTYPE_MASK: u32 = 0x3 << TFRTYPE_SHIFT;
    /// Continuous read mode
    pub const CRMODE: u32 = 1 << 14;
    /// Double data rate
    pub const DDREN: u32 = 1 << 15;
    /// Dummy cycle count field shift
    pub const DUMMYLEN_SHIFT: u32 = 16;
    /// Dummy cycle count field mask
    pub const DUMMYLEN_MASK: u32 = 0x1F << DUMMYLEN_SHIFT;
}

/// Encoded instruction frame configuration word
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameWord(u32);

impl FrameWord {
    /// Wrap a raw register value
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw register value
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Decoded I/O width
    pub const fn io_mode(&self) -> Option<IoMode> {
        IoMode::from_width_code(self.0 & bits::WIDTH_MASK)
    }

    /// Decoded transfer type
    pub const fn transfer_type(&self) -> TransferType {
        TransferType::from_code((self.0 & bits::TFRTYPE_MASK) >> bits::TFRTYPE_SHIFT)
    }

    /// Decoded address width
    pub const fn address_width(&self) -> AddressWidth {
        if self.0 & bits::ADDRLEN_32 != 0 {
            AddressWidth::FourByte
        } else {
            AddressWidth::ThreeByte
        }
    }

    /// Decoded dummy cycle count
    pub const fn dummy_cycles(&self) -> u8 {
        ((self.0 & bits::DUMMYLEN_MASK) >> bits::DUMMYLEN_SHIFT) as u8
    }

    /// Instruction phase enabled
    pub const fn has_instruction(&self) -> bool {
        self.0 & bits::INSTREN != 0
    }

    /// Address phase enabled
    pub const fn has_address(&self) -> bool {
        self.0 & bits::ADDREN != 0
    }

    /// Option code phase enabled
    pub const fn has_option_code(&self) -> bool {
        self.0 & bits::OPTCODEEN != 0
    }

    /// Data phase enabled
    pub const fn has_data(&self) -> bool {
        self.0 & bits::DATAEN != 0
    }

    /// Continuous read mode enabled
    pub const fn continuous_read(&self) -> bool {
        self.0 & bits::CRMODE != 0
    }
}

impl fmt::Debug for FrameWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameWord")
            .field("bits", &format_args!("0x{:08X}", self.0))
            .field("io_mode", &self.io_mode())
            .field("transfer", &self.transfer_type())
            .field("dummy_cycles", &self.dummy_cycles())
            .finish()
    }
}

/// Encode an instruction into a frame word
///
/// `tx_len` is the number of caller-supplied transmit bytes. When it is
/// nonzero a descriptor typed [`TransferType::Read`] is encoded as
/// [`TransferType::Write`]: register writes such as WRSR are issued through
/// generically typed register descriptors and rely on this. Memory-mapped
/// transfer types are never rewritten.
pub fn encode_frame(
    desc: &InstructionDescriptor,
    address_width: AddressWidth,
    tx_len: usize,
) -> FrameWord {
    debug_assert!(desc.dummy_cycles <= 31, "DUMMYLEN is a 5-bit field");

    let mut word = desc.io_mode.width_code() | bits::INSTREN;

    if desc.has_address {
        word |= bits::ADDREN;
    }
    if let Some(option) = desc.option_code {
        word |= bits::OPTCODEEN | (option.len.code() << bits::OPTCODELEN_SHIFT);
    }
    if desc.has_data {
        word |= bits::DATAEN;
    }
    if address_width == AddressWidth::FourByte {
        word |= bits::ADDRLEN_32;
    }
    if desc.continuous_read {
        word |= bits::CRMODE;
    }

    let transfer = match desc.transfer {
        TransferType::Read if tx_len > 0 => TransferType::Write,
        other => other,
    };
    word |= transfer.code() << bits::TFRTYPE_SHIFT;
    word |= ((desc.dummy_cycles as u32) << bits::DUMMYLEN_SHIFT) & bits::DUMMYLEN_MASK;

    FrameWord(word)
}

/// Encode the frame for a complete request
pub fn encode_request(request: &TransferRequest<'_>, address_width: AddressWidth) -> FrameWord {
    encode_frame(&request.instruction, address_width, request.data.tx_len())
}
