//! qspiflash-dummy - In-memory QSPI NOR flash emulator for testing
//!
//! This crate provides a transport that emulates a QSPI NOR flash part in
//! memory. It answers identification and status reads, tracks the write
//! enable latch and a busy countdown, and applies program and erase
//! commands to a backing buffer, so the device model can be exercised
//! without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use qspiflash_core::chip::{FlashDevice, JedecId, StatusLayout};
use qspiflash_core::error::{Error, Result};
use qspiflash_core::frame::{encode_request, FrameWord};
use qspiflash_core::spi::{opcodes, AddressWidth, DataPhase, IoMode, TransferRequest};
use qspiflash_core::transport::QspiTransport;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC ID returned by RDID
    pub jedec: JedecId,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Status register organisation
    pub status_layout: StatusLayout,
    /// Quad-enable bit, 0 if quad commands are always accepted
    pub quad_enable_bit_mask: u8,
    /// Number of status polls that report WIP after a program, erase or
    /// status write
    pub busy_polls: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            jedec: JedecId::new(0xEF, 0x40, 0x15), // W25Q16JV-IQ
            size: 2 * 1024 * 1024,
            page_size: 256,
            status_layout: StatusLayout::Combined,
            quad_enable_bit_mask: opcodes::SR2_QE,
            busy_polls: 0,
        }
    }
}

impl DummyConfig {
    /// Emulate the given device
    pub fn from_device(device: &FlashDevice) -> Self {
        Self {
            jedec: device.jedec,
            size: device.total_size as usize,
            page_size: device.page_size as usize,
            status_layout: device.status_layout,
            quad_enable_bit_mask: device.quad_enable_bit_mask,
            busy_polls: 0,
        }
    }

    /// Set the busy countdown used after each write operation
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }
}

/// One instruction as seen by the emulator
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedInstruction {
    /// Opcode
    pub opcode: u8,
    /// Address, if the instruction had an address phase
    pub address: Option<u32>,
    /// Frame word the instruction encodes to
    pub frame: FrameWord,
    /// Bytes sent to the device
    pub tx: Vec<u8>,
    /// Bytes requested from the device
    pub rx_len: usize,
}

/// Dummy flash transport
///
/// Emulates a QSPI flash part in memory for testing purposes.
#[cfg(feature = "alloc")]
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    // Non-volatile status bits; WIP and WEL are derived
    status_reg1: u8,
    status_reg2: u8,
    status_reg3: u8,
    write_enabled: bool,
    busy: u32,
    suspended: bool,
    reset_enabled: bool,
    address_width: AddressWidth,
    clock_hz: Option<u32>,
    delays: Vec<u32>,
    log: Vec<LoggedInstruction>,
    fail_on: Option<u8>,
    busy_violations: u32,
}

#[cfg(feature = "alloc")]
impl DummyFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            status_reg1: 0,
            status_reg2: 0,
            status_reg3: 0,
            write_enabled: false,
            busy: 0,
            suspended: false,
            reset_enabled: false,
            address_width: AddressWidth::ThreeByte,
            clock_hz: None,
            delays: Vec::new(),
            log: Vec::new(),
            fail_on: None,
            busy_violations: 0,
        }
    }

    /// Create a new dummy flash with default configuration (W25Q16JV-IQ)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash emulating the given device
    pub fn from_device(device: &FlashDevice) -> Self {
        Self::new(DummyConfig::from_device(device))
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Status register 1 as RDSR would return it
    pub fn status1(&self) -> u8 {
        let mut status = self.status_reg1;
        if self.busy > 0 {
            status |= opcodes::SR1_WIP;
        }
        if self.write_enabled {
            status |= opcodes::SR1_WEL;
        }
        status
    }

    /// Status register 2 as RDSR2 would return it
    pub fn status2(&self) -> u8 {
        if self.suspended {
            self.status_reg2 | opcodes::SR2_SUS
        } else {
            self.status_reg2
        }
    }

    /// Overwrite the non-volatile bits of status register 1
    pub fn set_status_reg1(&mut self, value: u8) {
        self.status_reg1 = value & !(opcodes::SR1_WIP | opcodes::SR1_WEL);
    }

    /// Overwrite the non-volatile bits of status register 2
    pub fn set_status_reg2(&mut self, value: u8) {
        self.status_reg2 = value & !opcodes::SR2_SUS;
    }

    /// Set or clear the write enable latch
    pub fn set_write_enabled(&mut self, enabled: bool) {
        self.write_enabled = enabled;
    }

    /// Report WIP for the next `polls` status reads
    pub fn set_busy(&mut self, polls: u32) {
        self.busy = polls;
    }

    /// Set or clear the erase/program suspend bit
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    /// Fail every instruction with this opcode
    pub fn fail_on_opcode(&mut self, opcode: Option<u8>) {
        self.fail_on = opcode;
    }

    /// True if quad commands are currently accepted
    pub fn quad_enabled(&self) -> bool {
        let mask = self.config.quad_enable_bit_mask;
        if mask == 0 {
            return true;
        }
        match self.config.status_layout {
            StatusLayout::SingleByte => self.status_reg1 & mask != 0,
            StatusLayout::Combined | StatusLayout::Split => self.status_reg2 & mask != 0,
        }
    }

    /// All instructions executed so far
    pub fn instructions(&self) -> &[LoggedInstruction] {
        &self.log
    }

    /// Opcodes of all instructions executed so far
    pub fn opcodes(&self) -> Vec<u8> {
        self.log.iter().map(|i| i.opcode).collect()
    }

    /// Forget the instruction log
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Last clock frequency requested
    pub fn clock_hz(&self) -> Option<u32> {
        self.clock_hz
    }

    /// All delays requested, in microseconds
    pub fn delays(&self) -> &[u32] {
        &self.delays
    }

    /// Number of commands issued while the part was busy
    pub fn busy_violations(&self) -> u32 {
        self.busy_violations
    }

    fn expect_direction(opcode: u8, frame: FrameWord, read: bool) -> Result<()> {
        if frame.transfer_type().is_read() != read {
            log::warn!(
                "dummy: opcode 0x{:02X} sent with wrong direction {:?}",
                opcode,
                frame
            );
            return Err(Error::TransferFailed);
        }
        Ok(())
    }

    fn check_address(&self, addr: u32, len: usize) -> Result<usize> {
        if u64::from(addr) >= self.address_width.max_size() {
            return Err(Error::AddressOutOfBounds);
        }
        let addr = addr as usize;
        if addr + len > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(addr)
    }

    fn check_quad(&self, opcode: u8, frame: FrameWord) -> Result<()> {
        if frame.io_mode() != Some(IoMode::QuadOutput) {
            log::warn!("dummy: quad opcode 0x{:02X} with {:?}", opcode, frame);
            return Err(Error::TransferFailed);
        }
        if !self.quad_enabled() {
            log::warn!("dummy: quad opcode 0x{:02X} while QE is clear", opcode);
            return Err(Error::OpcodeNotSupported);
        }
        Ok(())
    }

    fn handle_read(&mut self, opcode: u8, frame: FrameWord, addr: u32, buf: &mut [u8]) -> Result<()> {
        Self::expect_direction(opcode, frame, true)?;
        if opcode != opcodes::READ && frame.dummy_cycles() != opcodes::READ_DUMMY_CYCLES {
            return Err(Error::TransferFailed);
        }
        if opcode == opcodes::QOR {
            self.check_quad(opcode, frame)?;
        }

        let addr = self.check_address(addr, buf.len())?;
        buf.copy_from_slice(&self.data[addr..addr + buf.len()]);
        Ok(())
    }

    fn handle_page_program(
        &mut self,
        opcode: u8,
        frame: FrameWord,
        addr: u32,
        data: &[u8],
    ) -> Result<()> {
        Self::expect_direction(opcode, frame, false)?;
        if opcode == opcodes::QPP {
            self.check_quad(opcode, frame)?;
        }
        if !self.write_enabled {
            return Err(Error::WriteProtected);
        }

        let addr = self.check_address(addr, 0)?;
        let page_size = self.config.page_size;
        let page_base = addr - addr % page_size;
        let start = addr % page_size;

        // Flash programming: can only change 1 -> 0, wrapping inside the page
        for (i, &byte) in data.iter().enumerate() {
            let offset = (start + i) % page_size;
            self.data[page_base + offset] &= byte;
        }

        self.write_enabled = false;
        self.busy = self.config.busy_polls;
        Ok(())
    }

    fn handle_erase(&mut self, addr: u32, erase_size: usize) -> Result<()> {
        if !self.write_enabled {
            return Err(Error::WriteProtected);
        }

        let addr = self.check_address(addr, 0)?;
        // Align address to erase boundary
        let aligned_addr = addr & !(erase_size - 1);
        if aligned_addr + erase_size > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }

        self.erase_range(aligned_addr, erase_size);
        Ok(())
    }

    fn handle_chip_erase(&mut self) -> Result<()> {
        if !self.write_enabled {
            return Err(Error::WriteProtected);
        }
        self.erase_range(0, self.data.len());
        Ok(())
    }

    fn erase_range(&mut self, start: usize, len: usize) {
        let region = &mut self.data[start..start + len];
        // A blank region finishes immediately
        let blank = region.iter().all(|&b| b == 0xFF);
        region.fill(0xFF);

        self.write_enabled = false;
        self.busy = if blank { 0 } else { self.config.busy_polls };
    }

    fn handle_write_status(&mut self, opcode: u8, data: &[u8]) -> Result<()> {
        if opcode == opcodes::WRSR2 && self.config.status_layout == StatusLayout::SingleByte {
            return Err(Error::OpcodeNotSupported);
        }
        if !self.write_enabled {
            return Ok(());
        }

        match (opcode, self.config.status_layout) {
            (opcodes::WRSR2, _) => {
                if let Some(&sr2) = data.first() {
                    self.set_status_reg2(sr2);
                }
            }
            (_, StatusLayout::Combined) => {
                if let Some(&sr1) = data.first() {
                    self.set_status_reg1(sr1);
                }
                if let Some(&sr2) = data.get(1) {
                    self.set_status_reg2(sr2);
                }
            }
            (_, StatusLayout::Split | StatusLayout::SingleByte) => {
                if let Some(&sr1) = data.first() {
                    self.set_status_reg1(sr1);
                }
            }
        }

        self.write_enabled = false;
        self.busy = self.config.busy_polls;
        Ok(())
    }

    fn reset(&mut self) {
        log::debug!("dummy: software reset");
        self.write_enabled = false;
        self.busy = 0;
        self.suspended = false;
    }
}

#[cfg(feature = "alloc")]
impl QspiTransport for DummyFlash {
    fn execute(&mut self, request: &mut TransferRequest<'_>) -> Result<()> {
        let opcode = request.instruction.opcode;
        let frame = encode_request(request, self.address_width);
        let address = request.instruction.has_address.then_some(request.address);
        let (tx, rx_len) = match &request.data {
            DataPhase::None => (Vec::new(), 0),
            DataPhase::Read(buf) => (Vec::new(), buf.len()),
            DataPhase::Write(data) => (data.to_vec(), 0),
        };
        log::trace!("dummy: 0x{:02X} addr={:?} {:?}", opcode, address, frame);
        self.log.push(LoggedInstruction {
            opcode,
            address,
            frame,
            tx,
            rx_len,
        });

        if self.fail_on == Some(opcode) {
            return Err(Error::TransferFailed);
        }

        // Reset is only accepted directly after reset-enable
        let reset_enabled = core::mem::replace(&mut self.reset_enabled, false);

        let status_read = matches!(
            opcode,
            opcodes::RDSR | opcodes::RDSR2 | opcodes::RDSR3 | opcodes::RDID
        );
        if self.busy > 0 && !status_read {
            log::warn!("dummy: opcode 0x{:02X} ignored while busy", opcode);
            self.busy_violations += 1;
            return Ok(());
        }

        let addr = request.address;
        match (opcode, &mut request.data) {
            // Identification and status
            (opcodes::RDID, DataPhase::Read(buf)) => {
                Self::expect_direction(opcode, frame, true)?;
                let id = [
                    self.config.jedec.manufacturer,
                    self.config.jedec.memory_type,
                    self.config.jedec.capacity,
                ];
                for (b, v) in buf.iter_mut().zip(id) {
                    *b = v;
                }
                Ok(())
            }
            (opcodes::RDSR, DataPhase::Read(buf)) => {
                Self::expect_direction(opcode, frame, true)?;
                buf.fill(self.status1());
                self.busy = self.busy.saturating_sub(1);
                Ok(())
            }
            (opcodes::RDSR2, DataPhase::Read(buf)) => {
                Self::expect_direction(opcode, frame, true)?;
                buf.fill(self.status2());
                Ok(())
            }
            (opcodes::RDSR3, DataPhase::Read(buf)) => {
                Self::expect_direction(opcode, frame, true)?;
                buf.fill(self.status_reg3);
                Ok(())
            }
            (opcodes::WRSR | opcodes::WRSR2, DataPhase::Write(data)) => {
                Self::expect_direction(opcode, frame, false)?;
                let data: &[u8] = data;
                self.handle_write_status(opcode, data)
            }

            // Write enable/disable
            (opcodes::WREN, DataPhase::None) => {
                self.write_enabled = true;
                Ok(())
            }
            (opcodes::WRDI, DataPhase::None) => {
                self.write_enabled = false;
                Ok(())
            }

            // Memory access
            (opcodes::READ | opcodes::FAST_READ | opcodes::QOR, DataPhase::Read(buf)) => {
                self.handle_read(opcode, frame, addr, buf)
            }
            (opcodes::PP | opcodes::QPP, DataPhase::Write(data)) => {
                let data: &[u8] = data;
                self.handle_page_program(opcode, frame, addr, data)
            }

            // Erase commands
            (opcodes::SE_20, DataPhase::None) => self.handle_erase(addr, 4 * 1024),
            (opcodes::BE_52, DataPhase::None) => self.handle_erase(addr, 32 * 1024),
            (opcodes::BE_D8, DataPhase::None) => self.handle_erase(addr, 64 * 1024),
            (opcodes::CE_60 | opcodes::CE_C7, DataPhase::None) => self.handle_chip_erase(),

            // Software reset
            (opcodes::RSTEN, DataPhase::None) => {
                self.reset_enabled = true;
                Ok(())
            }
            (opcodes::RST, DataPhase::None) => {
                if reset_enabled {
                    self.reset();
                }
                Ok(())
            }

            // Unknown opcode or unexpected data phase
            _ => Err(Error::OpcodeNotSupported),
        }
    }

    fn address_width(&self) -> AddressWidth {
        self.address_width
    }

    fn set_address_width(&mut self, width: AddressWidth) {
        self.address_width = width;
    }

    fn set_clock_speed(&mut self, hz: u32) -> Result<()> {
        if hz == 0 {
            return Err(Error::InvalidClock);
        }
        self.clock_hz = Some(hz);
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        // No delay needed for in-memory operations
        self.delays.push(us);
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use qspiflash_core::chip::{find_known, Features, KNOWN_DEVICES};
    use qspiflash_core::flash::{DeviceState, FlashConfig, QspiFlash};
    use qspiflash_core::protocol::{self, MemoryAccess};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn quad_device(mask: u8, layout: StatusLayout) -> FlashDevice {
        FlashDevice::new("FIXTURE", JedecId::new(0xC8, 0x40, 0x15), 2 * 1024 * 1024)
            .with_timing(5000, 104)
            .with_quad_enable(mask, layout)
            .with_features(Features::QUAD)
    }

    fn busy_dummy() -> DummyFlash {
        DummyFlash::new(DummyConfig::default().with_busy_polls(3))
    }

    #[test]
    fn test_read_jedec_id() {
        let mut flash = DummyFlash::new_default();
        let id = protocol::read_jedec_id(&mut flash).unwrap();
        assert_eq!(id, JedecId::new(0xEF, 0x40, 0x15));
    }

    #[test]
    fn test_read_write() {
        let mut flash = DummyFlash::new_default();

        let data = [0x12, 0x34, 0x56, 0x78];
        protocol::program_page(&mut flash, MemoryAccess::Single, 0x1000, &data).unwrap();

        let mut buf = [0u8; 4];
        protocol::read_memory_with(&mut flash, MemoryAccess::Single, 0x1000, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_program_requires_write_enable() {
        let mut flash = DummyFlash::new_default();
        let result =
            protocol::write_memory_with(&mut flash, MemoryAccess::Single, 0, &[0x00]);
        assert_eq!(result, Err(Error::WriteProtected));
        assert_eq!(flash.data()[0], 0xFF);
    }

    #[test]
    fn test_page_program_wraps_within_page() {
        let mut flash = DummyFlash::new_default();
        let data = [0x00u8; 8];
        protocol::program_page(&mut flash, MemoryAccess::Single, 0x1FC, &data).unwrap();
        assert!(flash.data()[0x1FC..0x200].iter().all(|&b| b == 0x00));
        assert!(flash.data()[0x100..0x104].iter().all(|&b| b == 0x00));
        assert_eq!(flash.data()[0x200], 0xFF);
    }

    #[test]
    fn test_quad_commands_need_quad_enable() {
        let mut flash = DummyFlash::new_default();
        let mut buf = [0u8; 4];
        assert_eq!(
            protocol::read_memory(&mut flash, 0, &mut buf),
            Err(Error::OpcodeNotSupported)
        );
        flash.set_status_reg2(opcodes::SR2_QE);
        protocol::read_memory(&mut flash, 0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn test_erase_sizes() {
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &[0u8; 0x2_0000]);
        let ready = opcodes::SR1_WIP | opcodes::SR1_WEL;
        let policy = protocol::PollPolicy::new(1, 10);

        protocol::erase_at(&mut flash, opcodes::SE_20, 0x1234, ready, policy).unwrap();
        assert!(flash.data()[0x1000..0x2000].iter().all(|&b| b == 0xFF));
        assert_eq!(flash.data()[0x2000], 0x00);

        protocol::erase_at(&mut flash, opcodes::BE_52, 0x8000, ready, policy).unwrap();
        assert!(flash.data()[0x8000..0x1_0000].iter().all(|&b| b == 0xFF));
        assert_eq!(flash.data()[0x7FFF], 0x00);

        protocol::erase_at(&mut flash, opcodes::BE_D8, 0x1_0000, ready, policy).unwrap();
        assert!(flash.data()[0x1_0000..0x2_0000].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_write_status_without_wel_is_ignored() {
        let mut flash = DummyFlash::new_default();
        protocol::write_command(&mut flash, opcodes::WRSR, &[0x00, 0x02]).unwrap();
        assert_eq!(flash.status2(), 0);
        protocol::write_enable(&mut flash).unwrap();
        protocol::write_command(&mut flash, opcodes::WRSR, &[0x00, 0x02]).unwrap();
        assert_eq!(flash.status2(), 0x02);
        assert_eq!(flash.status1() & opcodes::SR1_WEL, 0);
    }

    #[test]
    fn test_reset_requires_reset_enable() {
        let mut flash = DummyFlash::new_default();
        flash.set_write_enabled(true);
        protocol::run_command(&mut flash, opcodes::RST).unwrap();
        assert_ne!(flash.status1() & opcodes::SR1_WEL, 0);
        protocol::software_reset(&mut flash, 30).unwrap();
        assert_eq!(flash.status1() & opcodes::SR1_WEL, 0);
        assert_eq!(flash.delays(), &[30]);
    }

    #[test]
    fn test_begin_selects_every_known_device() {
        init();
        for dev in KNOWN_DEVICES.iter() {
            let expected = find_known(dev.jedec).unwrap();
            let mut dummy = DummyFlash::new(DummyConfig::from_device(dev).with_busy_polls(2));
            let mut flash = QspiFlash::new(&mut dummy);

            let selected = flash.begin().unwrap();
            assert!(core::ptr::eq(selected, expected), "{}", dev.name);
            assert_eq!(flash.state(), DeviceState::Ready);

            let session = flash.session();
            assert_eq!(session.page_size(), expected.page_size);
            assert_eq!(session.sector_size(), expected.sector_size);
            assert_eq!(session.total_size(), expected.total_size);
            drop(flash);

            assert_eq!(dummy.busy_violations(), 0, "{}", dev.name);
            assert_eq!(dummy.clock_hz(), Some(expected.max_clock_hz()));
            if expected.has_quad_enable() {
                assert!(dummy.quad_enabled(), "{}", dev.name);
            }
        }
    }

    #[test]
    fn test_custom_table_reaches_shadowed_entry() {
        let table = [qspiflash_core::chip::S25FL216K];
        let mut dummy = DummyFlash::from_device(&table[0]);
        let mut flash = QspiFlash::with_devices(&mut dummy, &table);
        assert_eq!(flash.begin().unwrap().name, "S25FL216K");
    }

    #[test]
    fn test_capacity_byte_selects_second_entry() {
        let table = [
            FlashDevice::new("SMALL", JedecId::new(0xC8, 0x40, 0x15), 2 * 1024 * 1024),
            FlashDevice::new("LARGE", JedecId::new(0xC8, 0x40, 0x17), 8 * 1024 * 1024),
        ];
        let mut dummy = DummyFlash::from_device(&table[1]);
        let mut flash = QspiFlash::with_devices(&mut dummy, &table);
        let selected = flash.begin().unwrap();
        assert!(core::ptr::eq(selected, &table[1]));
        assert_eq!(flash.session().total_size(), 8 * 1024 * 1024);
    }

    #[test]
    fn test_begin_unknown_device() {
        let mut dummy = DummyFlash::new(DummyConfig {
            jedec: JedecId::new(0xAB, 0xCD, 0xEF),
            ..DummyConfig::default()
        });
        let mut flash = QspiFlash::new(&mut dummy);
        assert!(matches!(
            flash.begin(),
            Err(Error::DeviceNotFound {
                manufacturer: 0xAB,
                ..
            })
        ));
        assert_eq!(flash.state(), DeviceState::Uninitialized);
        let mut buf = [0u8; 4];
        assert_eq!(flash.read_buffer(0, &mut buf), Err(Error::NotInitialized));
        assert_eq!(flash.erase_sector(0), Err(Error::NotInitialized));
    }

    #[test]
    fn test_quad_enable_branches() {
        init();
        let cases: [(StatusLayout, u8, u8, &[u8]); 3] = [
            (StatusLayout::Combined, 0x02, opcodes::WRSR, &[0x00, 0x02]),
            (StatusLayout::Split, 0x02, opcodes::WRSR2, &[0x02]),
            (StatusLayout::SingleByte, 0x40, opcodes::WRSR, &[0x40]),
        ];

        for (layout, mask, opcode, payload) in cases {
            let table = [quad_device(mask, layout)];
            let mut dummy = DummyFlash::new(DummyConfig::from_device(&table[0]).with_busy_polls(1));
            let mut flash = QspiFlash::with_devices(&mut dummy, &table);
            flash.begin().unwrap();
            drop(flash);

            let log = dummy.instructions();
            let write = log
                .iter()
                .position(|i| i.opcode == opcode && !i.tx.is_empty())
                .unwrap();
            assert_eq!(log[write - 1].opcode, opcodes::WREN, "{:?}", layout);
            assert_eq!(log[write].tx, payload, "{:?}", layout);
            assert!(dummy.quad_enabled(), "{:?}", layout);
        }
    }

    #[test]
    fn test_quad_enable_skipped_when_already_set() {
        let mut dummy = DummyFlash::new_default();
        dummy.set_status_reg2(opcodes::SR2_QE);
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();
        drop(flash);
        assert!(!dummy.opcodes().contains(&opcodes::WRSR));
        assert!(!dummy.opcodes().contains(&opcodes::WREN));
    }

    #[test]
    fn test_begin_waits_for_interrupted_operation() {
        let mut dummy = busy_dummy();
        dummy.set_busy(5);
        dummy.set_write_enabled(true);
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();
        assert_eq!(flash.read_status().unwrap() & opcodes::SR1_WEL, 0);
        drop(flash);
        assert_eq!(dummy.busy_violations(), 0);
    }

    #[test]
    fn test_begin_times_out_when_suspended() {
        let mut dummy = DummyFlash::new_default();
        dummy.set_suspended(true);
        let config = FlashConfig::new().with_timeout_us(100);
        let mut flash = QspiFlash::new(&mut dummy).with_config(config);
        assert_eq!(
            flash.begin(),
            Err(Error::DeviceNotResponding { status: 0x80 })
        );
        assert_eq!(flash.state(), DeviceState::Uninitialized);
    }

    #[test]
    fn test_stuck_device_reports_not_responding() {
        let mut dummy = DummyFlash::new_default();
        let config = FlashConfig::new().with_timeout_us(1000);
        let mut flash = QspiFlash::new(&mut dummy).with_config(config);
        flash.begin().unwrap();
        flash.transport_mut().set_busy(u32::MAX);
        assert_eq!(
            flash.chip_erase(),
            Err(Error::DeviceNotResponding { status: 0x01 })
        );
        assert_eq!(flash.state(), DeviceState::Ready);
    }

    #[test]
    fn test_stale_write_enable_is_cleared() {
        let mut dummy = DummyFlash::new_default();
        dummy.data_mut()[..4].copy_from_slice(&[1, 2, 3, 4]);
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();

        flash.write_enable().unwrap();
        flash.transport_mut().clear_log();
        let mut buf = [0u8; 4];
        assert_eq!(flash.read_buffer(0, &mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(
            flash.transport().opcodes(),
            vec![opcodes::RDSR, opcodes::WRDI, opcodes::RDSR, opcodes::QOR]
        );

        flash.write_enable().unwrap();
        flash.chip_erase().unwrap();
        flash.write_enable().unwrap();
        flash.erase_sector(0).unwrap();
        assert_eq!(flash.read_status().unwrap() & opcodes::SR1_WEL, 0);
    }

    #[test]
    fn test_transfer_failure_propagates() {
        let mut dummy = DummyFlash::new_default();
        dummy.fail_on_opcode(Some(opcodes::RDID));
        let mut flash = QspiFlash::new(&mut dummy);
        assert_eq!(flash.begin(), Err(Error::TransferFailed));
    }

    #[test]
    fn test_single_page_write_is_one_program() {
        let mut dummy = busy_dummy();
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();
        flash.transport_mut().clear_log();

        let data = [0x5Au8; 32];
        assert_eq!(flash.write_buffer(0x1010, &data).unwrap(), 32);
        drop(flash);

        let programs: Vec<_> = dummy
            .instructions()
            .iter()
            .filter(|i| i.opcode == opcodes::QPP)
            .collect();
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].address, Some(0x1010));
        assert_eq!(programs[0].tx.len(), 32);
        assert_eq!(dummy.busy_violations(), 0);
    }

    #[test]
    fn test_cross_page_write_is_chunked() {
        let mut dummy = busy_dummy();
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();
        flash.transport_mut().clear_log();

        let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        flash.write_buffer(0x10F0, &data).unwrap();
        drop(flash);

        let log = dummy.instructions();
        let mut total = 0;
        let mut chunks = 0;
        for (i, inst) in log.iter().enumerate() {
            if inst.opcode != opcodes::QPP {
                continue;
            }
            let addr = inst.address.unwrap();
            let len = inst.tx.len() as u32;
            assert!(len <= 256);
            assert_eq!(addr / 256, (addr + len - 1) / 256);
            assert_eq!(log[i - 1].opcode, opcodes::WREN);
            total += len;
            chunks += 1;
        }
        assert_eq!(total, 1000);
        assert_eq!(chunks, 5);
        assert_eq!(&dummy.data()[0x10F0..0x10F0 + 1000], &data[..]);
        assert_eq!(dummy.busy_violations(), 0);
    }

    #[test]
    fn test_round_trip() {
        let mut dummy = busy_dummy();
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();

        let data: Vec<u8> = (0..777u32).map(|i| (i * 7) as u8).collect();
        flash.write_buffer(0x2345, &data).unwrap();

        let mut buf = vec![0u8; data.len()];
        assert_eq!(flash.read_buffer(0x2345, &mut buf).unwrap(), data.len());
        assert_eq!(buf, data);
    }

    #[test]
    fn test_chip_erase_twice() {
        let mut dummy = busy_dummy();
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();
        flash.write_buffer(0x100, &[0u8; 64]).unwrap();

        flash.chip_erase().unwrap();
        assert!(flash.transport().data().iter().all(|&b| b == 0xFF));

        flash.transport_mut().clear_log();
        flash.chip_erase().unwrap();
        drop(flash);

        assert!(dummy.data().iter().all(|&b| b == 0xFF));
        let log = dummy.opcodes();
        let erase = log.iter().position(|&op| op == opcodes::CE_C7).unwrap();
        assert_eq!(&log[erase + 1..], &[opcodes::RDSR]);
        assert_eq!(dummy.busy_violations(), 0);
    }

    #[test]
    fn test_erase_sector_only_touches_sector() {
        let mut dummy = busy_dummy();
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();
        flash.write_buffer(0, &[0u8; 8192]).unwrap();

        flash.erase_sector(1).unwrap();
        drop(flash);

        assert!(dummy.data()[..4096].iter().all(|&b| b == 0x00));
        assert!(dummy.data()[4096..8192].iter().all(|&b| b == 0xFF));
        assert_eq!(dummy.busy_violations(), 0);
    }

    #[test]
    fn test_erase_block() {
        let mut dummy = busy_dummy();
        dummy.data_mut()[0x1_0000..0x2_0000].fill(0x00);
        dummy.data_mut()[0x2_0000] = 0x00;
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();
        flash.erase_block(1).unwrap();
        drop(flash);

        assert!(dummy.data()[0x1_0000..0x2_0000].iter().all(|&b| b == 0xFF));
        assert_eq!(dummy.data()[0x2_0000], 0x00);
    }

    #[test]
    fn test_sequential_access() {
        let mut dummy = busy_dummy();
        let mut flash = QspiFlash::new(&mut dummy);
        flash.begin().unwrap();

        flash.seek(0x300).unwrap();
        assert_eq!(flash.write(b"hello").unwrap(), 5);
        assert_eq!(flash.write(b" world").unwrap(), 6);
        assert_eq!(flash.position(), 0x30B);

        flash.seek(0x300).unwrap();
        let mut buf = [0u8; 11];
        assert_eq!(flash.read(&mut buf).unwrap(), 11);
        assert_eq!(&buf, b"hello world");
        assert_eq!(flash.read16(0x300).unwrap(), u16::from_le_bytes([b'h', b'e']));
    }

    #[test]
    fn test_single_lane_device() {
        let table = [FlashDevice::new("PLAIN", JedecId::new(0x1F, 0x84, 0x01), 512 * 1024)];
        let mut dummy = DummyFlash::new(DummyConfig {
            quad_enable_bit_mask: 0,
            ..DummyConfig::from_device(&table[0])
        });
        let mut flash = QspiFlash::with_devices(&mut dummy, &table);
        flash.begin().unwrap();
        flash.write_buffer(0x10, &[1, 2, 3, 4]).unwrap();
        assert_eq!(flash.read32(0x10).unwrap(), 0x0403_0201);
        drop(flash);

        let ops = dummy.opcodes();
        assert!(ops.contains(&opcodes::PP));
        assert!(ops.contains(&opcodes::FAST_READ));
        assert!(!ops.contains(&opcodes::QPP));
    }
}
