//! Flash command facade
//!
//! Thin wrappers that build an [`InstructionDescriptor`] from an opcode and
//! hand a [`TransferRequest`] to the transport. No opcode validation is done
//! here; transport errors are returned unchanged.

use crate::error::Result;
use crate::spi::{
    InstructionDescriptor, TransferRequest, FAST_READ, PAGE_PROGRAM, QUAD_PAGE_PROGRAM, QUAD_READ,
};
use crate::transport::QspiTransport;

/// Lane usage for memory-mapped data transfers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemoryAccess {
    /// Quad output read (0x6B) and quad page program (0x32)
    #[default]
    Quad,
    /// Fast read (0x0B) and page program (0x02)
    Single,
}

impl MemoryAccess {
    /// Instruction used to read memory
    pub const fn read_instruction(&self) -> InstructionDescriptor {
        match self {
            Self::Quad => QUAD_READ,
            Self::Single => FAST_READ,
        }
    }

    /// Instruction used to program a page
    pub const fn program_instruction(&self) -> InstructionDescriptor {
        match self {
            Self::Quad => QUAD_PAGE_PROGRAM,
            Self::Single => PAGE_PROGRAM,
        }
    }
}

/// Send an opcode with no address and no data (e.g., WREN, RSTEN)
pub fn run_command<T: QspiTransport + ?Sized>(transport: &mut T, opcode: u8) -> Result<()> {
    let mut request = TransferRequest::new(InstructionDescriptor::command(opcode));
    transport.execute(&mut request)
}

/// Send an opcode and read `buf.len()` bytes back (e.g., RDSR, RDID)
pub fn read_command<T: QspiTransport + ?Sized>(
    transport: &mut T,
    opcode: u8,
    buf: &mut [u8],
) -> Result<()> {
    let mut request = TransferRequest::read(InstructionDescriptor::register(opcode), buf);
    transport.execute(&mut request)
}

/// Send an opcode followed by `data` (e.g., WRSR)
pub fn write_command<T: QspiTransport + ?Sized>(
    transport: &mut T,
    opcode: u8,
    data: &[u8],
) -> Result<()> {
    // Register descriptors are typed as reads; the frame encoder turns this
    // into a write because transmit data is present.
    let mut request = TransferRequest::write(InstructionDescriptor::register(opcode), data);
    transport.execute(&mut request)
}

/// Send an opcode followed by an address (e.g., sector erase)
pub fn erase_command<T: QspiTransport + ?Sized>(
    transport: &mut T,
    opcode: u8,
    address: u32,
) -> Result<()> {
    let mut request = TransferRequest::new(InstructionDescriptor::erase(opcode)).with_address(address);
    transport.execute(&mut request)
}

/// Quad read of `buf.len()` bytes starting at `address`
pub fn read_memory<T: QspiTransport + ?Sized>(
    transport: &mut T,
    address: u32,
    buf: &mut [u8],
) -> Result<()> {
    read_memory_with(transport, MemoryAccess::Quad, address, buf)
}

/// Quad page program of `data` at `address`
///
/// The caller is responsible for write-enable and for keeping `data` inside
/// one page.
pub fn write_memory<T: QspiTransport + ?Sized>(
    transport: &mut T,
    address: u32,
    data: &[u8],
) -> Result<()> {
    write_memory_with(transport, MemoryAccess::Quad, address, data)
}

/// Read memory using the given lane configuration
pub fn read_memory_with<T: QspiTransport + ?Sized>(
    transport: &mut T,
    access: MemoryAccess,
    address: u32,
    buf: &mut [u8],
) -> Result<()> {
    let mut request = TransferRequest::read(access.read_instruction(), buf).with_address(address);
    transport.execute(&mut request)
}

/// Program memory using the given lane configuration
pub fn write_memory_with<T: QspiTransport + ?Sized>(
    transport: &mut T,
    access: MemoryAccess,
    address: u32,
    data: &[u8],
) -> Result<()> {
    let mut request =
        TransferRequest::write(access.program_instruction(), data).with_address(address);
    transport.execute(&mut request)
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::spi::{opcodes, TransferType};
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_run_command() {
        let mut t = MockTransport::new();
        run_command(&mut t, opcodes::WREN).unwrap();
        let r = &t.log[0];
        assert_eq!(r.opcode, 0x06);
        assert_eq!(r.address, None);
        assert!(!r.frame.has_data());
        assert!(r.tx.is_empty() && r.rx_len == 0);
    }

    #[test]
    fn test_read_command() {
        let mut t = MockTransport::new();
        t.jedec = [0xEF, 0x40, 0x17];
        let mut id = [0u8; 3];
        read_command(&mut t, opcodes::RDID, &mut id).unwrap();
        assert_eq!(id, [0xEF, 0x40, 0x17]);
        assert_eq!(t.log[0].frame.transfer_type(), TransferType::Read);
        assert_eq!(t.log[0].rx_len, 3);
    }

    #[test]
    fn test_write_command_is_encoded_as_write() {
        let mut t = MockTransport::new();
        write_command(&mut t, opcodes::WRSR, &[0x00, 0x02]).unwrap();
        let r = &t.log[0];
        assert_eq!(r.frame.transfer_type(), TransferType::Write);
        assert!(r.frame.has_data());
        assert_eq!(r.tx, [0x00, 0x02]);
    }

    #[test]
    fn test_erase_command() {
        let mut t = MockTransport::new();
        erase_command(&mut t, opcodes::SE_20, 0x3000).unwrap();
        let r = &t.log[0];
        assert_eq!(r.address, Some(0x3000));
        assert!(r.frame.has_address());
        assert!(!r.frame.has_data());
    }

    #[test]
    fn test_read_memory_uses_quad_read() {
        let mut t = MockTransport::new();
        t.memory[0x10..0x14].copy_from_slice(&[1, 2, 3, 4]);
        let mut buf = [0u8; 4];
        read_memory(&mut t, 0x10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        let r = &t.log[0];
        assert_eq!(r.opcode, opcodes::QOR);
        assert_eq!(r.frame.dummy_cycles(), 8);
        assert_eq!(r.frame.transfer_type(), TransferType::ReadMemory);
    }

    #[test]
    fn test_write_memory_single_lane() {
        let mut t = MockTransport::new();
        write_memory_with(&mut t, MemoryAccess::Single, 0x100, &[0xAA; 16]).unwrap();
        let r = &t.log[0];
        assert_eq!(r.opcode, opcodes::PP);
        assert_eq!(r.frame.transfer_type(), TransferType::WriteMemory);
        assert_eq!(r.tx.len(), 16);
    }

    #[test]
    fn test_transport_error_propagates() {
        let mut t = MockTransport::new();
        t.fail_opcode = Some(opcodes::WREN);
        assert_eq!(run_command(&mut t, opcodes::WREN), Err(Error::TransferFailed));
    }
}
