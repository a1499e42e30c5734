//! SAMD51 QSPI and CMCC register definitions and access

/// QSPI peripheral base address
pub const QSPI_BASE: usize = 0x4200_1C00;
/// Cortex-M cache controller base address
pub const CMCC_BASE: usize = 0x4100_6000;
/// Memory-mapped flash window
pub const QSPI_AHB_BASE: usize = 0x0400_0000;
/// Size of the memory-mapped flash window
pub const QSPI_AHB_SIZE: u32 = 0x0100_0000;

/// QSPI register bits
pub mod qspi {
    /// CTRLA: software reset
    pub const CTRLA_SWRST: u32 = 1 << 0;
    /// CTRLA: enable
    pub const CTRLA_ENABLE: u32 = 1 << 1;
    /// CTRLA: last transfer, deasserts chip select
    pub const CTRLA_LASTXFER: u32 = 1 << 24;

    /// CTRLB: serial memory mode
    pub const CTRLB_MODE_MEMORY: u32 = 1 << 0;
    /// CTRLB: chip select deasserted on LASTXFER
    pub const CTRLB_CSMODE_LASTXFER: u32 = 1 << 4;
    /// CTRLB: 8-bit data length
    pub const CTRLB_DATALEN_8BITS: u32 = 0 << 8;

    /// BAUD: divider field shift
    pub const BAUD_SHIFT: u32 = 8;
    /// BAUD: divider field mask
    pub const BAUD_MASK: u32 = 0xFF << BAUD_SHIFT;

    /// INTFLAG: instruction end
    pub const INTFLAG_INSTREND: u32 = 1 << 10;

    /// INSTRCTRL: option code shift
    pub const INSTRCTRL_OPTCODE_SHIFT: u32 = 16;
}

/// CMCC register bits
pub mod cmcc {
    /// CTRL: cache enable
    pub const CTRL_CEN: u32 = 1 << 0;
    /// SR: cache controller status (1 while enabled)
    pub const SR_CSTS: u32 = 1 << 0;
    /// MAINT0: invalidate all
    pub const MAINT0_INVALL: u32 = 1 << 0;
}

/// Registers touched by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// QSPI CTRLA
    CtrlA,
    /// QSPI CTRLB
    CtrlB,
    /// QSPI BAUD
    Baud,
    /// QSPI INTFLAG
    IntFlag,
    /// QSPI INSTRADDR
    InstrAddr,
    /// QSPI INSTRCTRL
    InstrCtrl,
    /// QSPI INSTRFRAME
    InstrFrame,
    /// CMCC CTRL
    CmccCtrl,
    /// CMCC SR
    CmccSr,
    /// CMCC MAINT0
    CmccMaint0,
}

impl Register {
    /// Offset from the owning peripheral's base address
    pub const fn offset(&self) -> usize {
        match self {
            Self::CtrlA => 0x00,
            Self::CtrlB => 0x04,
            Self::Baud => 0x08,
            Self::IntFlag => 0x1C,
            Self::InstrAddr => 0x30,
            Self::InstrCtrl => 0x34,
            Self::InstrFrame => 0x38,
            Self::CmccCtrl => 0x08,
            Self::CmccSr => 0x0C,
            Self::CmccMaint0 => 0x20,
        }
    }

    /// True for cache controller registers
    pub const fn is_cmcc(&self) -> bool {
        matches!(self, Self::CmccCtrl | Self::CmccSr | Self::CmccMaint0)
    }
}

/// Access to the QSPI and CMCC registers and the flash window
///
/// [`MmioRegisters`] is the hardware implementation; tests substitute a
/// fake that records the access sequence.
pub trait RegisterBlock {
    /// Read a register
    fn read(&mut self, reg: Register) -> u32;

    /// Write a register
    fn write(&mut self, reg: Register, value: u32);

    /// Copy `buf.len()` bytes out of the flash window starting at `offset`
    fn read_window(&mut self, offset: u32, buf: &mut [u8]);

    /// Copy `data` into the flash window starting at `offset`
    fn write_window(&mut self, offset: u32, data: &[u8]);

    /// Data and instruction synchronization barriers
    fn barrier(&mut self);

    /// Busy-wait for roughly `cycles` core clock cycles
    fn delay_cycles(&mut self, cycles: u32) {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::delay(cycles);
        #[cfg(not(target_arch = "arm"))]
        for _ in 0..cycles {
            core::hint::spin_loop();
        }
    }
}

/// Volatile access to the real peripherals
#[derive(Debug)]
pub struct MmioRegisters {
    qspi_base: usize,
    cmcc_base: usize,
    window_base: usize,
}

impl MmioRegisters {
    /// Access peripherals at explicit base addresses
    ///
    /// # Safety
    ///
    /// The addresses must be the QSPI, CMCC and QSPI AHB window of the
    /// running chip, and no other code may drive those peripherals while
    /// this value exists.
    pub const unsafe fn new(qspi_base: usize, cmcc_base: usize, window_base: usize) -> Self {
        Self {
            qspi_base,
            cmcc_base,
            window_base,
        }
    }

    /// Access the peripherals at their SAMD51 addresses
    ///
    /// # Safety
    ///
    /// Same contract as [`MmioRegisters::new`].
    pub const unsafe fn samd51() -> Self {
        Self::new(QSPI_BASE, CMCC_BASE, QSPI_AHB_BASE)
    }

    #[inline]
    fn address(&self, reg: Register) -> usize {
        let base = if reg.is_cmcc() {
            self.cmcc_base
        } else {
            self.qspi_base
        };
        base + reg.offset()
    }
}

impl RegisterBlock for MmioRegisters {
    #[inline]
    fn read(&mut self, reg: Register) -> u32 {
        // SAFETY: the address is a register of a peripheral owned by self
        unsafe { core::ptr::read_volatile(self.address(reg) as *const u32) }
    }

    #[inline]
    fn write(&mut self, reg: Register, value: u32) {
        // SAFETY: the address is a register of a peripheral owned by self
        unsafe { core::ptr::write_volatile(self.address(reg) as *mut u32, value) }
    }

    fn read_window(&mut self, offset: u32, buf: &mut [u8]) {
        let src = (self.window_base + offset as usize) as *const u8;
        for (i, byte) in buf.iter_mut().enumerate() {
            // SAFETY: the caller keeps offset + len inside the window
            *byte = unsafe { core::ptr::read_volatile(src.add(i)) };
        }
    }

    fn write_window(&mut self, offset: u32, data: &[u8]) {
        let dst = (self.window_base + offset as usize) as *mut u8;
        for (i, &byte) in data.iter().enumerate() {
            // SAFETY: the caller keeps offset + len inside the window
            unsafe { core::ptr::write_volatile(dst.add(i), byte) };
        }
    }

    #[inline]
    fn barrier(&mut self) {
        #[cfg(target_arch = "arm")]
        {
            cortex_m::asm::dsb();
            cortex_m::asm::isb();
        }
        #[cfg(not(target_arch = "arm"))]
        core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
    }
}
