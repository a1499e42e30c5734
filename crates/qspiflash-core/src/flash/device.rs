//! QSPI NOR flash device model
//!
//! [`QspiFlash`] owns a transport and walks an attached NOR part through
//! identification, reset and quad-mode configuration, then serves reads,
//! page-split writes and erases against the identified geometry.

use crate::chip::{find_by_jedec, FlashDevice, JedecId};
use crate::error::{Error, Result};
use crate::protocol::{self, MemoryAccess, PollPolicy, QuadEnable};
use crate::spi::opcodes;
use crate::transport::QspiTransport;

use super::config::FlashConfig;
use super::context::{DeviceState, FlashSession};
use super::operations::PageChunks;

/// Driver for one QSPI NOR flash part
///
/// Every operation other than identification requires a successful
/// [`begin`](Self::begin) and returns [`Error::NotInitialized`] otherwise.
pub struct QspiFlash<'d, T: QspiTransport> {
    transport: T,
    config: FlashConfig,
    devices: &'d [FlashDevice],
    state: DeviceState,
    session: FlashSession<'d>,
}

#[cfg(feature = "builtin-devices")]
impl<T: QspiTransport> QspiFlash<'static, T> {
    /// Create a driver that identifies parts against the built-in table
    pub fn new(transport: T) -> Self {
        Self::with_devices(transport, &crate::chip::KNOWN_DEVICES)
    }
}

impl<'d, T: QspiTransport> QspiFlash<'d, T> {
    /// Create a driver that identifies parts against `devices`
    ///
    /// Entries are matched in order; the first exact JEDEC match wins.
    pub fn with_devices(transport: T, devices: &'d [FlashDevice]) -> Self {
        Self {
            transport,
            config: FlashConfig::default(),
            devices,
            state: DeviceState::Uninitialized,
            session: FlashSession::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: FlashConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Get the current state
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Get the identified device, if any
    pub fn device(&self) -> Option<&'d FlashDevice> {
        self.session.device
    }

    /// Get the session state
    pub fn session(&self) -> &FlashSession<'d> {
        &self.session
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the driver and return the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn set_state(&mut self, state: DeviceState) {
        if self.state != state {
            log::trace!("flash state: {} -> {}", self.state, state);
            self.state = state;
        }
    }

    fn require_device(&self) -> Result<&'d FlashDevice> {
        if !self.state.is_initialized() {
            return Err(Error::NotInitialized);
        }
        self.session.device.ok_or(Error::NotInitialized)
    }

    fn read_access(device: &FlashDevice) -> MemoryAccess {
        if device.supports_quad_read() {
            MemoryAccess::Quad
        } else {
            MemoryAccess::Single
        }
    }

    fn write_access(&self, device: &FlashDevice) -> MemoryAccess {
        if self.config.quad_writes && device.supports_quad_write() {
            MemoryAccess::Quad
        } else {
            MemoryAccess::Single
        }
    }

    /// Run `f` in `state`, returning to `Ready` afterwards whether or not
    /// it succeeded
    fn run_in_state<R>(
        &mut self,
        state: DeviceState,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.set_state(state);
        let result = f(self);
        self.set_state(DeviceState::Ready);
        result
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Identify and configure the attached device
    ///
    /// Reads the JEDEC ID, waits for any operation interrupted by an MCU
    /// reset to finish, resets the part, sets its quad-enable bit and
    /// clears block protection where the part needs it. On failure the
    /// driver is left `Uninitialized`.
    pub fn begin(&mut self) -> Result<&'d FlashDevice> {
        self.session = FlashSession::default();
        self.transport.set_address_width(self.config.address_width);

        match self.identify_and_configure() {
            Ok(device) => {
                self.session = FlashSession::new(device);
                self.set_state(DeviceState::Ready);
                Ok(device)
            }
            Err(e) => {
                log::debug!("flash begin failed: {}", e);
                self.set_state(DeviceState::Uninitialized);
                Err(e)
            }
        }
    }

    fn identify_and_configure(&mut self) -> Result<&'d FlashDevice> {
        let config = self.config.clone();

        self.set_state(DeviceState::Identifying);
        let id = protocol::read_jedec_id(&mut self.transport)?;
        let devices = self.devices;
        let device = find_by_jedec(devices, id).ok_or(Error::DeviceNotFound {
            manufacturer: id.manufacturer,
            memory_type: id.memory_type,
            capacity: id.capacity,
        })?;
        log::info!(
            "Found {} ({}), {} KiB",
            device.name,
            id,
            device.total_size / 1024
        );

        self.set_state(DeviceState::Resetting);
        if config.wait_start_up {
            self.transport.delay_us(u32::from(device.start_up_time_us));
        }
        // WEL may still be latched from before the MCU reset; only WIP matters here
        protocol::wait_ready(&mut self.transport, opcodes::SR1_WIP, config.ready_poll)?;
        protocol::wait_not_suspended(&mut self.transport, config.ready_poll)?;
        protocol::software_reset(&mut self.transport, config.reset_settle_us)?;

        self.set_state(DeviceState::ConfiguringQuadMode);
        let quad = protocol::enable_quad_mode(
            &mut self.transport,
            device,
            config.ready_mask,
            config.status_write_poll,
        )?;
        if quad == QuadEnable::Enabled {
            log::debug!("{}: quad mode enabled", device.name);
        }

        if device.has_sector_protection() {
            log::debug!("{}: clearing block protection", device.name);
            protocol::clear_block_protection(
                &mut self.transport,
                config.ready_mask,
                config.status_write_poll,
            )?;
        }

        protocol::write_disable(&mut self.transport)?;
        protocol::wait_ready(&mut self.transport, config.ready_mask, config.ready_poll)?;

        if config.clock_ramp {
            let hz = config
                .max_clock_hz
                .map_or(device.max_clock_hz(), |cap| cap.min(device.max_clock_hz()));
            log::debug!("{}: clock set to {} Hz", device.name, hz);
            self.transport.set_clock_speed(hz)?;
        }

        Ok(device)
    }

    /// Forget the identified device
    pub fn end(&mut self) {
        self.session = FlashSession::default();
        self.set_state(DeviceState::Uninitialized);
    }

    // ------------------------------------------------------------------
    // Identification and status
    // ------------------------------------------------------------------

    /// Read the JEDEC ID from the bus
    pub fn read_jedec_id(&mut self) -> Result<JedecId> {
        protocol::read_jedec_id(&mut self.transport)
    }

    /// Read the JEDEC ID packed as `0x00MMTTCC`
    pub fn jedec_id_u32(&mut self) -> Result<u32> {
        self.read_jedec_id().map(|id| id.as_u32())
    }

    /// Read the manufacturer ID and the device ID
    ///
    /// The device ID is the capacity byte of the JEDEC ID.
    pub fn manufacturer_info(&mut self) -> Result<(u8, u8)> {
        let id = self.read_jedec_id()?;
        Ok((id.manufacturer, id.capacity))
    }

    /// Read status register 1
    pub fn read_status(&mut self) -> Result<u8> {
        self.require_device()?;
        protocol::read_status1(&mut self.transport)
    }

    /// Read status register 2
    pub fn read_status2(&mut self) -> Result<u8> {
        self.require_device()?;
        protocol::read_status2(&mut self.transport)
    }

    /// Set the write enable latch
    ///
    /// Erase and program operations send their own write enable. A latch
    /// still set when the next operation starts is cleared with WRDI
    /// before that operation runs.
    pub fn write_enable(&mut self) -> Result<()> {
        self.require_device()?;
        protocol::write_enable(&mut self.transport)
    }

    /// Clear the write enable latch
    pub fn write_disable(&mut self) -> Result<()> {
        self.require_device()?;
        protocol::write_disable(&mut self.transport)
    }

    /// Poll until the device reports ready; returns the final status
    pub fn wait_for_ready(&mut self) -> Result<u8> {
        self.require_device()?;
        self.wait_ready(self.config.ready_poll)
    }

    /// Wait for the busy bits of the ready mask, then drop a write enable
    /// latch left over from an earlier [`write_enable`](Self::write_enable)
    fn wait_ready(&mut self, policy: PollPolicy) -> Result<u8> {
        let mask = self.config.ready_mask;
        let status = protocol::wait_ready(&mut self.transport, mask & !opcodes::SR1_WEL, policy)?;
        if status & mask & opcodes::SR1_WEL == 0 {
            return Ok(status);
        }

        log::debug!("clearing stale write enable latch (status 0x{:02X})", status);
        protocol::write_disable(&mut self.transport)?;
        protocol::wait_ready(&mut self.transport, mask, policy)
    }

    /// Change the serial clock
    pub fn set_clock_speed(&mut self, hz: u32) -> Result<()> {
        self.transport.set_clock_speed(hz)
    }

    // ------------------------------------------------------------------
    // Erase
    // ------------------------------------------------------------------

    /// Erase the whole device and wait for completion
    pub fn chip_erase(&mut self) -> Result<()> {
        let device = self.require_device()?;
        log::debug!("{}: chip erase", device.name);
        self.run_in_state(DeviceState::Erasing, |this| {
            this.wait_ready(this.config.ready_poll)?;
            let (mask, policy) = (this.config.ready_mask, this.config.chip_erase_poll);
            protocol::chip_erase(&mut this.transport, mask, policy)
        })
    }

    /// Erase the sector with the given index and wait for completion
    pub fn erase_sector(&mut self, sector: u32) -> Result<()> {
        let device = self.require_device()?;
        if sector >= device.sector_count() {
            return Err(Error::SectorOutOfRange);
        }
        let addr = sector * device.sector_size;
        let policy = self.config.sector_erase_poll;
        self.erase_region(opcodes::SE_20, addr, policy)
    }

    /// Erase the 64 KiB block with the given index and wait for completion
    pub fn erase_block(&mut self, block: u32) -> Result<()> {
        let device = self.require_device()?;
        if block >= device.block_count() {
            return Err(Error::SectorOutOfRange);
        }
        let addr = block * device.block_size;
        let policy = self.config.block_erase_poll;
        self.erase_region(opcodes::BE_D8, addr, policy)
    }

    fn erase_region(&mut self, opcode: u8, addr: u32, policy: PollPolicy) -> Result<()> {
        log::trace!("erase 0x{:02X} at 0x{:06X}", opcode, addr);
        self.run_in_state(DeviceState::Erasing, |this| {
            this.wait_ready(this.config.ready_poll)?;
            let mask = this.config.ready_mask;
            protocol::erase_at(&mut this.transport, opcode, addr, mask, policy)
        })
    }

    // ------------------------------------------------------------------
    // Read / write
    // ------------------------------------------------------------------

    /// Read `buf.len()` bytes starting at `addr`
    ///
    /// Returns the number of bytes read.
    pub fn read_buffer(&mut self, addr: u32, buf: &mut [u8]) -> Result<usize> {
        let device = self.require_device()?;
        if !device.is_valid_range(addr, buf.len()) {
            return Err(Error::AddressOutOfBounds);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        self.wait_ready(self.config.ready_poll)?;
        protocol::read_memory_with(&mut self.transport, Self::read_access(device), addr, buf)?;
        Ok(buf.len())
    }

    /// Program `data` starting at `addr`, split at page boundaries
    ///
    /// The target region must already be erased. Returns the number of
    /// bytes written once the last page program has completed.
    pub fn write_buffer(&mut self, addr: u32, data: &[u8]) -> Result<usize> {
        let device = self.require_device()?;
        if !device.is_valid_range(addr, data.len()) {
            return Err(Error::AddressOutOfBounds);
        }
        if data.is_empty() {
            return Ok(0);
        }

        let access = self.write_access(device);
        self.run_in_state(DeviceState::Programming, |this| {
            let policy = this.config.page_program_poll;
            for (chunk_addr, chunk) in PageChunks::new(addr, data, device.page_size) {
                this.wait_ready(policy)?;
                protocol::program_page(&mut this.transport, access, chunk_addr, chunk)?;
            }
            this.wait_ready(policy)?;
            Ok(data.len())
        })
    }

    /// Read one byte
    pub fn read8(&mut self, addr: u32) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_buffer(addr, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a little-endian u16
    pub fn read16(&mut self, addr: u32) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_buffer(addr, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a little-endian u32
    pub fn read32(&mut self, addr: u32) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_buffer(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    // ------------------------------------------------------------------
    // Sequential access
    // ------------------------------------------------------------------

    /// Move the session cursor
    pub fn seek(&mut self, pos: u32) -> Result<()> {
        let device = self.require_device()?;
        if pos > device.total_size {
            return Err(Error::AddressOutOfBounds);
        }
        self.session.cursor = pos;
        Ok(())
    }

    /// Current session cursor
    pub fn position(&self) -> u32 {
        self.session.cursor
    }

    /// Read at the cursor and advance it
    ///
    /// Reads stop at the end of the device; returns the number of bytes read.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.require_device()?;
        let len = buf.len().min(self.session.remaining() as usize);
        let n = self.read_buffer(self.session.cursor, &mut buf[..len])?;
        self.session.cursor += n as u32;
        Ok(n)
    }

    /// Program at the cursor and advance it
    ///
    /// Writes stop at the end of the device; returns the number of bytes
    /// written.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.require_device()?;
        let len = data.len().min(self.session.remaining() as usize);
        let n = self.write_buffer(self.session.cursor, &data[..len])?;
        self.session.cursor += n as u32;
        Ok(n)
    }
}

impl<T: QspiTransport> core::fmt::Debug for QspiFlash<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QspiFlash")
            .field("state", &self.state)
            .field("device", &self.session.device.map(|d| &d.name))
            .field("cursor", &self.session.cursor)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "std", feature = "builtin-devices"))]
mod tests {
    use super::*;
    use crate::chip::{Features, StatusLayout};
    use crate::transport::mock::MockTransport;
    use std::vec;
    use std::vec::Vec;

    fn gd25q16c_mock() -> MockTransport {
        let mut t = MockTransport::new();
        t.jedec = [0xC8, 0x40, 0x15];
        t.sr2 = 0x02;
        t
    }

    #[test]
    fn test_begin_sequence() {
        let mut t = gd25q16c_mock();
        let mut flash = QspiFlash::new(&mut t);
        let dev = flash.begin().unwrap();
        assert_eq!(dev.name, "GD25Q16C");
        assert_eq!(flash.state(), DeviceState::Ready);
        assert_eq!(flash.position(), 0);
        drop(flash);

        assert_eq!(
            t.opcodes(),
            vec![
                opcodes::RDID,
                opcodes::RDSR,
                opcodes::RDSR2,
                opcodes::RSTEN,
                opcodes::RST,
                opcodes::RDSR2,
                opcodes::WRDI,
                opcodes::RDSR,
            ]
        );
        assert_eq!(t.delays, vec![30]);
        assert_eq!(t.clock_hz, Some(104_000_000));
    }

    #[test]
    fn test_begin_unknown_device() {
        let mut t = MockTransport::new();
        t.jedec = [0x12, 0x34, 0x56];
        let mut flash = QspiFlash::new(&mut t);
        let err = flash.begin().unwrap_err();
        assert_eq!(
            err,
            Error::DeviceNotFound {
                manufacturer: 0x12,
                memory_type: 0x34,
                capacity: 0x56
            }
        );
        assert_eq!(flash.state(), DeviceState::Uninitialized);
        assert!(flash.device().is_none());
        assert_eq!(flash.read_status(), Err(Error::NotInitialized));
        assert_eq!(flash.chip_erase(), Err(Error::NotInitialized));
        assert_eq!(flash.write_buffer(0, &[0]), Err(Error::NotInitialized));
    }

    #[test]
    fn test_clock_ramp_respects_cap_and_start_up_wait() {
        let mut t = gd25q16c_mock();
        let config = FlashConfig::new()
            .with_max_clock_hz(48_000_000)
            .with_wait_start_up(true);
        let mut flash = QspiFlash::new(&mut t).with_config(config);
        flash.begin().unwrap();
        drop(flash);
        assert_eq!(t.clock_hz, Some(48_000_000));
        assert_eq!(t.delays, vec![5000, 30]);
    }

    #[test]
    fn test_sector_protection_cleared() {
        let mut t = MockTransport::new();
        t.jedec = [0x1F, 0x45, 0x02];
        let mut flash = QspiFlash::new(&mut t);
        assert_eq!(flash.begin().unwrap().name, "AT25DF081A");
        drop(flash);
        let ops = t.opcodes();
        let wrsr = ops.iter().position(|&op| op == opcodes::WRSR).unwrap();
        assert_eq!(ops[wrsr - 1], opcodes::WREN);
        assert_eq!(t.log[wrsr].tx, [0x00]);
    }

    #[test]
    fn test_write_buffer_splits_pages() {
        let mut t = gd25q16c_mock();
        let mut flash = QspiFlash::new(&mut t);
        flash.begin().unwrap();
        flash.transport_mut().log.clear();

        let data = [0xA5u8; 300];
        assert_eq!(flash.write_buffer(0xF0, &data).unwrap(), 300);
        assert_eq!(flash.state(), DeviceState::Ready);
        drop(flash);

        let programs: Vec<_> = t
            .log
            .iter()
            .filter(|r| r.opcode == opcodes::QPP)
            .map(|r| (r.address.unwrap(), r.tx.len()))
            .collect();
        assert_eq!(programs, vec![(0xF0, 16), (0x100, 256), (0x200, 28)]);

        for (i, r) in t.log.iter().enumerate() {
            if r.opcode == opcodes::QPP {
                assert_eq!(t.log[i - 1].opcode, opcodes::WREN);
            }
        }
    }

    #[test]
    fn test_single_lane_fallback() {
        let dev = FlashDevice::new("PLAIN", JedecId::new(0xC8, 0x40, 0x15), 1 << 21)
            .with_features(Features::FAST_READ);
        let devices = [dev];
        let mut t = MockTransport::new();
        let mut flash = QspiFlash::with_devices(&mut t, &devices);
        flash.begin().unwrap();
        flash.write_buffer(0, &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 3];
        flash.read_buffer(0, &mut buf).unwrap();
        drop(flash);

        let ops = t.opcodes();
        assert!(ops.contains(&opcodes::PP));
        assert!(ops.contains(&opcodes::FAST_READ));
        assert!(!ops.contains(&opcodes::QPP));
        assert!(!ops.contains(&opcodes::QOR));
    }

    #[test]
    fn test_quad_writes_disabled() {
        let mut t = gd25q16c_mock();
        let config = FlashConfig::new().with_quad_writes(false);
        let mut flash = QspiFlash::new(&mut t).with_config(config);
        flash.begin().unwrap();
        flash.write_buffer(0, &[0; 8]).unwrap();
        drop(flash);
        assert!(t.opcodes().contains(&opcodes::PP));
    }

    #[test]
    fn test_erase_index_checks() {
        let mut t = gd25q16c_mock();
        let mut flash = QspiFlash::new(&mut t);
        flash.begin().unwrap();
        assert_eq!(flash.erase_sector(512), Err(Error::SectorOutOfRange));
        assert_eq!(flash.erase_block(32), Err(Error::SectorOutOfRange));

        flash.transport_mut().log.clear();
        flash.erase_sector(3).unwrap();
        flash.erase_block(1).unwrap();
        drop(flash);

        let erases: Vec<_> = t
            .log
            .iter()
            .filter(|r| r.opcode == opcodes::SE_20 || r.opcode == opcodes::BE_D8)
            .map(|r| (r.opcode, r.address))
            .collect();
        assert_eq!(
            erases,
            vec![
                (opcodes::SE_20, Some(3 * 4096)),
                (opcodes::BE_D8, Some(0x1_0000))
            ]
        );
    }

    #[test]
    fn test_read_helpers_little_endian() {
        let mut t = gd25q16c_mock();
        t.memory[0x20..0x24].copy_from_slice(&[0x78, 0x56, 0x34, 0x12]);
        let mut flash = QspiFlash::new(&mut t);
        flash.begin().unwrap();
        assert_eq!(flash.read8(0x20).unwrap(), 0x78);
        assert_eq!(flash.read16(0x20).unwrap(), 0x5678);
        assert_eq!(flash.read32(0x20).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_read_out_of_range() {
        let mut t = gd25q16c_mock();
        let mut flash = QspiFlash::new(&mut t);
        flash.begin().unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(
            flash.read_buffer(2 * 1024 * 1024 - 2, &mut buf),
            Err(Error::AddressOutOfBounds)
        );
    }

    #[test]
    fn test_sequential_cursor() {
        let mut t = gd25q16c_mock();
        t.memory[0x100..0x104].copy_from_slice(&[1, 2, 3, 4]);
        let mut flash = QspiFlash::new(&mut t);
        flash.begin().unwrap();

        flash.seek(0x100).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(flash.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(flash.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [3, 4]);
        assert_eq!(flash.position(), 0x104);

        assert_eq!(flash.seek(2 * 1024 * 1024 + 1), Err(Error::AddressOutOfBounds));
        flash.seek(2 * 1024 * 1024 - 2).unwrap();
        assert_eq!(flash.write(&[0; 8]).unwrap(), 2);
        assert_eq!(flash.position(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_end_returns_to_uninitialized() {
        let mut t = gd25q16c_mock();
        let mut flash = QspiFlash::new(&mut t);
        flash.begin().unwrap();
        flash.end();
        assert_eq!(flash.state(), DeviceState::Uninitialized);
        assert_eq!(flash.write_enable(), Err(Error::NotInitialized));
        // identification does not need an initialized driver
        assert_eq!(flash.jedec_id_u32().unwrap(), 0x00C8_4015);
        assert_eq!(flash.manufacturer_info().unwrap(), (0xC8, 0x15));
    }

    #[test]
    fn test_quad_enable_failure_leaves_uninitialized() {
        let dev = FlashDevice::new("QE", JedecId::new(0xC8, 0x40, 0x15), 1 << 21)
            .with_quad_enable(0x02, StatusLayout::Split)
            .with_features(Features::QUAD);
        let devices = [dev];
        let mut t = MockTransport::new();
        let mut flash = QspiFlash::with_devices(&mut t, &devices);
        assert_eq!(flash.begin(), Err(Error::QuadEnableFailed));
        assert_eq!(flash.state(), DeviceState::Uninitialized);
    }
}
