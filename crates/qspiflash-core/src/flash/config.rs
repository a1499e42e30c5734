//! Flash driver configuration

use crate::error::{Error, Result};
use crate::protocol::PollPolicy;
use crate::spi::{opcodes, AddressWidth};

/// Tunables for [`QspiFlash`](super::QspiFlash)
///
/// The poll policies bound every busy-wait; the defaults sit comfortably
/// above typical datasheet maxima for the parts in the built-in table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashConfig {
    /// Address length programmed into instruction frames
    pub address_width: AddressWidth,
    /// SR1 bits that must all be clear for the device to count as ready
    ///
    /// Defaults to WIP | WEL. With WEL in the mask a bare
    /// [`write_enable`](super::QspiFlash::write_enable) leaves the device
    /// "busy" until the latch is consumed or cleared with write-disable.
    pub ready_mask: u8,
    /// Generic ready polling (status reads, before commands)
    pub ready_poll: PollPolicy,
    /// Status register writes
    pub status_write_poll: PollPolicy,
    /// Page program
    pub page_program_poll: PollPolicy,
    /// 4 KiB sector erase
    pub sector_erase_poll: PollPolicy,
    /// 64 KiB block erase
    pub block_erase_poll: PollPolicy,
    /// Chip erase
    pub chip_erase_poll: PollPolicy,
    /// Delay after the reset sequence
    pub reset_settle_us: u32,
    /// Wait the identified part's start-up time before resetting it
    pub wait_start_up: bool,
    /// Use quad page program when the part supports it
    pub quad_writes: bool,
    /// Raise the clock to the part's maximum after identification
    pub clock_ramp: bool,
    /// Upper bound for the clock chosen by `clock_ramp`
    pub max_clock_hz: Option<u32>,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            address_width: AddressWidth::ThreeByte,
            ready_mask: opcodes::SR1_WIP | opcodes::SR1_WEL,
            ready_poll: PollPolicy::new(10, 100_000),
            status_write_poll: PollPolicy::new(1_000, 500_000),
            page_program_poll: PollPolicy::new(10, 10_000),
            sector_erase_poll: PollPolicy::new(1_000, 2_000_000),
            block_erase_poll: PollPolicy::new(10_000, 4_000_000),
            chip_erase_poll: PollPolicy::new(100_000, 400_000_000),
            reset_settle_us: 30,
            wait_start_up: false,
            quad_writes: true,
            clock_ramp: true,
            max_clock_hz: None,
        }
    }
}

impl FlashConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address width
    pub fn with_address_width(mut self, width: AddressWidth) -> Self {
        self.address_width = width;
        self
    }

    /// Set the ready mask
    pub fn with_ready_mask(mut self, mask: u8) -> Self {
        self.ready_mask = mask;
        self
    }

    /// Set the reset settle delay
    pub fn with_reset_settle_us(mut self, us: u32) -> Self {
        self.reset_settle_us = us;
        self
    }

    /// Enable or disable quad page program
    pub fn with_quad_writes(mut self, enabled: bool) -> Self {
        self.quad_writes = enabled;
        self
    }

    /// Enable or disable the post-identification clock ramp
    pub fn with_clock_ramp(mut self, enabled: bool) -> Self {
        self.clock_ramp = enabled;
        self
    }

    /// Cap the serial clock
    pub fn with_max_clock_hz(mut self, hz: u32) -> Self {
        self.max_clock_hz = Some(hz);
        self
    }

    /// Wait for the part's start-up time during `begin()`
    pub fn with_wait_start_up(mut self, enabled: bool) -> Self {
        self.wait_start_up = enabled;
        self
    }

    /// Override every poll policy's timeout, keeping the intervals
    pub fn with_timeout_us(mut self, timeout_us: u32) -> Self {
        for policy in [
            &mut self.ready_poll,
            &mut self.status_write_poll,
            &mut self.page_program_poll,
            &mut self.sector_erase_poll,
            &mut self.block_erase_poll,
            &mut self.chip_erase_poll,
        ] {
            policy.timeout_us = timeout_us;
        }
        self
    }

    /// Parse options from key-value pairs
    ///
    /// Supported options:
    /// - `address_width=24|32`
    /// - `ready_mask=<u8>` (decimal or 0x-prefixed hex)
    /// - `quad_writes=on|off`
    /// - `clock_ramp=on|off`
    /// - `wait_start_up=on|off`
    /// - `max_clock_hz=<u32>`
    /// - `reset_settle_us=<u32>`
    /// - `timeout_us=<u32>`
    pub fn from_options(options: &[(&str, &str)]) -> Result<Self> {
        let mut config = Self::default();

        for (key, value) in options {
            match *key {
                "address_width" | "addr" => {
                    let bits = parse_u32(value)?;
                    config.address_width =
                        AddressWidth::from_bits(bits).ok_or(Error::InvalidOption)?;
                }
                "ready_mask" => {
                    config.ready_mask =
                        u8::try_from(parse_u32(value)?).map_err(|_| Error::InvalidOption)?;
                }
                "quad_writes" => config.quad_writes = parse_bool(value)?,
                "clock_ramp" => config.clock_ramp = parse_bool(value)?,
                "wait_start_up" => config.wait_start_up = parse_bool(value)?,
                "max_clock_hz" | "clock" => config.max_clock_hz = Some(parse_u32(value)?),
                "reset_settle_us" => config.reset_settle_us = parse_u32(value)?,
                "timeout_us" => config = config.with_timeout_us(parse_u32(value)?),
                _ => {
                    log::warn!("Unknown flash option: {}={}", key, value);
                }
            }
        }

        Ok(config)
    }
}

fn parse_u32(value: &str) -> Result<u32> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| Error::InvalidOption)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "on" | "yes" | "true" => Ok(true),
        "0" | "off" | "no" | "false" => Ok(false),
        _ => Err(Error::InvalidOption),
    }
}
