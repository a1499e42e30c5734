//! SAMD51 QSPI controller driver
//!
//! Every instruction is run through the INSTRCTRL/INSTRADDR/INSTRFRAME
//! registers. Data phases go through the memory-mapped AHB window, so the
//! Cortex-M cache controller is disabled and invalidated around each
//! transfer unless the caller has taken over that bracketing.

use qspiflash_core::frame::{encode_request, FrameWord};
use qspiflash_core::spi::{AddressWidth, CachePolicy, DataPhase, TransferRequest};
use qspiflash_core::transport::QspiTransport;

use crate::error::{Result, SamdQspiError};
use crate::options::SamdQspiOptions;
use crate::regs::{cmcc, qspi, Register, RegisterBlock, QSPI_AHB_SIZE};

/// Settle time after a software reset of the peripheral
const RESET_DELAY_US: u32 = 1_000;

/// SAMD51 QSPI transport
pub struct SamdQspi<R: RegisterBlock> {
    regs: R,
    options: SamdQspiOptions,
    address_width: AddressWidth,
}

impl<R: RegisterBlock> SamdQspi<R> {
    /// Reset and enable the controller in serial memory mode
    ///
    /// The serial clock starts at `options.initial_clock_hz`; the flash
    /// device model raises it once the part has been identified.
    pub fn new(regs: R, options: SamdQspiOptions) -> Result<Self> {
        let mut this = Self {
            regs,
            options,
            address_width: options.address_width,
        };

        this.regs.write(Register::CtrlA, qspi::CTRLA_SWRST);
        this.delay_us(RESET_DELAY_US);

        this.regs.write(
            Register::CtrlB,
            qspi::CTRLB_MODE_MEMORY | qspi::CTRLB_CSMODE_LASTXFER | qspi::CTRLB_DATALEN_8BITS,
        );
        let divider = this.divider_for(options.initial_clock_hz)?;
        this.regs
            .write(Register::Baud, (divider as u32) << qspi::BAUD_SHIFT);
        this.regs.write(Register::CtrlA, qspi::CTRLA_ENABLE);

        log::debug!(
            "SAMD QSPI enabled: MCK {} Hz, BAUD {}, {}-bit addressing",
            options.mck_hz,
            divider,
            this.address_width.bits()
        );

        Ok(this)
    }

    /// Current options
    pub fn options(&self) -> &SamdQspiOptions {
        &self.options
    }

    /// Release the register block
    pub fn release(self) -> R {
        self.regs
    }

    /// Current BAUD divider
    pub fn clock_divider(&mut self) -> u8 {
        ((self.regs.read(Register::Baud) & qspi::BAUD_MASK) >> qspi::BAUD_SHIFT) as u8
    }

    /// Program a raw BAUD divider; SCK = MCK / (divider + 1)
    pub fn set_clock_divider(&mut self, divider: u8) {
        let baud = self.regs.read(Register::Baud) & !qspi::BAUD_MASK;
        self.regs
            .write(Register::Baud, baud | ((divider as u32) << qspi::BAUD_SHIFT));
    }

    /// Smallest divider whose output does not exceed `hz`
    fn divider_for(&self, hz: u32) -> Result<u8> {
        if hz == 0 || self.options.mck_hz == 0 {
            return Err(SamdQspiError::InvalidClock {
                hz,
                mck_hz: self.options.mck_hz,
            });
        }
        let divider = self.options.mck_hz.div_ceil(hz).saturating_sub(1);
        Ok(divider.min(u8::MAX as u32) as u8)
    }

    fn disable_cache(&mut self) -> Result<()> {
        self.regs.write(Register::CmccCtrl, 0);
        let mut polls = 0;
        while self.regs.read(Register::CmccSr) & cmcc::SR_CSTS != 0 {
            polls += 1;
            if polls >= self.options.completion_poll_limit {
                return Err(SamdQspiError::CacheTimeout { polls });
            }
        }
        self.regs.write(Register::CmccMaint0, cmcc::MAINT0_INVALL);
        Ok(())
    }

    fn enable_cache(&mut self) {
        self.regs.write(Register::CmccCtrl, cmcc::CTRL_CEN);
    }

    fn run(&mut self, request: &mut TransferRequest<'_>, frame: FrameWord) -> Result<()> {
        let opcode = request.instruction.opcode;
        let optcode = request
            .instruction
            .option_code
            .map_or(0, |option| option.value as u32);

        self.regs.write(
            Register::InstrCtrl,
            opcode as u32 | (optcode << qspi::INSTRCTRL_OPTCODE_SHIFT),
        );
        self.regs.write(Register::InstrAddr, request.address);
        self.regs.write(Register::InstrFrame, frame.bits());

        // Synchronizes the frame write before touching the window
        let _ = self.regs.read(Register::InstrFrame);

        match &mut request.data {
            DataPhase::None => {}
            DataPhase::Read(buf) => self.regs.read_window(request.address, buf),
            DataPhase::Write(data) => self.regs.write_window(request.address, data),
        }

        self.regs.barrier();
        self.regs
            .write(Register::CtrlA, qspi::CTRLA_ENABLE | qspi::CTRLA_LASTXFER);

        let mut polls = 0;
        while self.regs.read(Register::IntFlag) & qspi::INTFLAG_INSTREND == 0 {
            polls += 1;
            if polls >= self.options.completion_poll_limit {
                return Err(SamdQspiError::InstructionTimeout { opcode, polls });
            }
        }
        self.regs.write(Register::IntFlag, qspi::INTFLAG_INSTREND);

        Ok(())
    }

    fn execute_inner(&mut self, request: &mut TransferRequest<'_>) -> Result<()> {
        if !request.is_empty() {
            let end = request.address as u64 + request.len() as u64;
            if end > QSPI_AHB_SIZE as u64 {
                return Err(SamdQspiError::AddressOutOfWindow {
                    address: request.address,
                    len: request.len(),
                });
            }
        }

        let frame = encode_request(request, self.address_width);
        log::trace!(
            "QSPI 0x{:02X} addr=0x{:06X} len={} frame=0x{:08X}",
            request.instruction.opcode,
            request.address,
            request.len(),
            frame.bits()
        );

        let bracket = self.options.cache_bracket && request.cache == CachePolicy::Bracket;
        if !bracket {
            return self.run(request, frame);
        }

        let result = self.disable_cache().and_then(|()| self.run(request, frame));
        self.enable_cache();
        result
    }
}

impl<R: RegisterBlock> QspiTransport for SamdQspi<R> {
    fn execute(&mut self, request: &mut TransferRequest<'_>) -> qspiflash_core::Result<()> {
        self.execute_inner(request).map_err(|e| {
            log::error!("{}", e);
            e.into()
        })
    }

    fn address_width(&self) -> AddressWidth {
        self.address_width
    }

    fn set_address_width(&mut self, width: AddressWidth) {
        self.address_width = width;
    }

    fn set_clock_speed(&mut self, hz: u32) -> qspiflash_core::Result<()> {
        let divider = self.divider_for(hz)?;
        self.set_clock_divider(divider);
        log::debug!(
            "QSPI clock {} Hz requested, BAUD {} gives {} Hz",
            hz,
            divider,
            self.options.mck_hz / (divider as u32 + 1)
        );
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        let cycles_per_us = self.options.mck_hz / 1_000_000;
        self.regs.delay_cycles(us.saturating_mul(cycles_per_us));
    }
}

impl<R: RegisterBlock> core::fmt::Debug for SamdQspi<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SamdQspi")
            .field("options", &self.options)
            .field("address_width", &self.address_width)
            .finish_non_exhaustive()
    }
}
