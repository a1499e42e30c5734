//! Serial NOR command sequences
//!
//! Named operations built on the command facade: identification, status
//! register access, busy polling, reset, quad-enable and erase/program.

use crate::chip::{FlashDevice, JedecId, StatusLayout, StatusRegister};
use crate::error::{Error, Result};
use crate::spi::opcodes;
use crate::transport::QspiTransport;

use super::commands::{
    erase_command, read_command, run_command, write_command, write_memory_with, MemoryAccess,
};

/// How often and for how long to poll the status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between polls in microseconds
    pub interval_us: u32,
    /// Total time budget in microseconds
    pub timeout_us: u32,
}

impl PollPolicy {
    /// Create a poll policy
    pub const fn new(interval_us: u32, timeout_us: u32) -> Self {
        Self {
            interval_us,
            timeout_us,
        }
    }

    /// Number of polls after the first read before giving up
    pub const fn max_polls(&self) -> u32 {
        if self.interval_us > 0 {
            self.timeout_us / self.interval_us
        } else {
            // Fall back to polling once per microsecond
            self.timeout_us
        }
    }
}

/// Outcome of [`enable_quad_mode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadEnable {
    /// The device has no quad-enable bit
    NotApplicable,
    /// The bit was already set; nothing was written
    AlreadyEnabled,
    /// The status register was written and the bit read back set
    Enabled,
}

/// Read the JEDEC ID
pub fn read_jedec_id<T: QspiTransport + ?Sized>(transport: &mut T) -> Result<JedecId> {
    let mut buf = [0u8; 3];
    read_command(transport, opcodes::RDID, &mut buf)?;
    Ok(JedecId::from_bytes(buf))
}

/// Read the status register 1
pub fn read_status1<T: QspiTransport + ?Sized>(transport: &mut T) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_command(transport, opcodes::RDSR, &mut buf)?;
    Ok(buf[0])
}

/// Read the status register 2
pub fn read_status2<T: QspiTransport + ?Sized>(transport: &mut T) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_command(transport, opcodes::RDSR2, &mut buf)?;
    Ok(buf[0])
}

/// Read the given status register
pub fn read_status<T: QspiTransport + ?Sized>(
    transport: &mut T,
    register: StatusRegister,
) -> Result<u8> {
    match register {
        StatusRegister::Sr1 => read_status1(transport),
        StatusRegister::Sr2 => read_status2(transport),
    }
}

/// Send the Write Enable command
pub fn write_enable<T: QspiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    run_command(transport, opcodes::WREN)
}

/// Send the Write Disable command
pub fn write_disable<T: QspiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    run_command(transport, opcodes::WRDI)
}

/// Poll SR1 until none of the bits in `mask` are set
///
/// Returns the last status value read. On timeout returns
/// [`Error::DeviceNotResponding`] carrying that value.
///
/// # Typical poll intervals
/// * Page program: 10us
/// * 4KB sector erase: 1ms
/// * 64KB block erase: 10ms
/// * Chip erase: 100ms
pub fn wait_ready<T: QspiTransport + ?Sized>(
    transport: &mut T,
    mask: u8,
    policy: PollPolicy,
) -> Result<u8> {
    let max_polls = policy.max_polls();
    let mut status = read_status1(transport)?;
    let mut polls = 0;

    while status & mask != 0 {
        if polls >= max_polls {
            log::warn!(
                "Flash still busy after {}us (status 0x{:02X})",
                policy.timeout_us,
                status
            );
            return Err(Error::DeviceNotResponding { status });
        }
        if policy.interval_us > 0 {
            transport.delay_us(policy.interval_us);
        }
        status = read_status1(transport)?;
        polls += 1;
    }

    Ok(status)
}

/// Poll SR2 until the erase/program suspend bit clears
pub fn wait_not_suspended<T: QspiTransport + ?Sized>(
    transport: &mut T,
    policy: PollPolicy,
) -> Result<()> {
    let max_polls = policy.max_polls();
    let mut polls = 0;

    loop {
        let status = read_status2(transport)?;
        if status & opcodes::SR2_SUS == 0 {
            return Ok(());
        }
        if polls >= max_polls {
            return Err(Error::DeviceNotResponding { status });
        }
        if policy.interval_us > 0 {
            transport.delay_us(policy.interval_us);
        }
        polls += 1;
    }
}

/// Enable-reset followed by reset, then wait `settle_us`
pub fn software_reset<T: QspiTransport + ?Sized>(transport: &mut T, settle_us: u32) -> Result<()> {
    run_command(transport, opcodes::RSTEN)?;
    run_command(transport, opcodes::RST)?;
    transport.delay_us(settle_us);
    Ok(())
}

/// Set the quad-enable bit if the device has one and it is clear
///
/// The write depends on the status register layout: split-register parts
/// take the mask alone through WRSR2, single-byte parts take it alone
/// through WRSR, and the rest take `[0x00, mask]` through WRSR. The bit is
/// read back after the write completes.
pub fn enable_quad_mode<T: QspiTransport + ?Sized>(
    transport: &mut T,
    device: &FlashDevice,
    ready_mask: u8,
    policy: PollPolicy,
) -> Result<QuadEnable> {
    let mask = device.quad_enable_bit_mask;
    if mask == 0 {
        return Ok(QuadEnable::NotApplicable);
    }

    let register = device.status_layout.quad_enable_register();
    if read_status(transport, register)? & mask != 0 {
        return Ok(QuadEnable::AlreadyEnabled);
    }

    write_enable(transport)?;
    let full_status = [0x00, mask];
    match device.status_layout {
        StatusLayout::Split => write_command(transport, opcodes::WRSR2, &full_status[1..])?,
        StatusLayout::SingleByte => write_command(transport, opcodes::WRSR, &full_status[1..])?,
        StatusLayout::Combined => write_command(transport, opcodes::WRSR, &full_status)?,
    }
    wait_ready(transport, ready_mask, policy)?;

    if read_status(transport, register)? & mask == 0 {
        log::warn!("{}: quad enable bit did not stick", device.name);
        return Err(Error::QuadEnableFailed);
    }
    Ok(QuadEnable::Enabled)
}

/// Clear block protection by writing SR1 = 0
pub fn clear_block_protection<T: QspiTransport + ?Sized>(
    transport: &mut T,
    ready_mask: u8,
    policy: PollPolicy,
) -> Result<()> {
    write_enable(transport)?;
    write_command(transport, opcodes::WRSR, &[0x00])?;
    wait_ready(transport, ready_mask, policy).map(|_| ())
}

/// Program up to one page
///
/// Sends WREN first; does not wait for completion.
pub fn program_page<T: QspiTransport + ?Sized>(
    transport: &mut T,
    access: MemoryAccess,
    addr: u32,
    data: &[u8],
) -> Result<()> {
    write_enable(transport)?;
    write_memory_with(transport, access, addr, data)
}

/// Erase with an address-bearing opcode (sector or block erase)
///
/// Sends WREN first and polls until the erase completes.
pub fn erase_at<T: QspiTransport + ?Sized>(
    transport: &mut T,
    opcode: u8,
    addr: u32,
    ready_mask: u8,
    policy: PollPolicy,
) -> Result<()> {
    write_enable(transport)?;
    erase_command(transport, opcode, addr)?;
    wait_ready(transport, ready_mask, policy).map(|_| ())
}

/// Erase the entire chip
///
/// Sends WREN first and polls until the erase completes.
pub fn chip_erase<T: QspiTransport + ?Sized>(
    transport: &mut T,
    ready_mask: u8,
    policy: PollPolicy,
) -> Result<()> {
    write_enable(transport)?;
    run_command(transport, opcodes::CE_C7)?;
    wait_ready(transport, ready_mask, policy).map(|_| ())
}
