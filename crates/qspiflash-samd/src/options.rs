//! SAMD51 QSPI transport options

use qspiflash_core::spi::AddressWidth;

use crate::error::{Result, SamdQspiError};

/// Configuration for [`SamdQspi`](crate::SamdQspi)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamdQspiOptions {
    /// Main clock feeding the QSPI peripheral
    pub mck_hz: u32,
    /// Serial clock programmed at reset, before the flash is identified
    pub initial_clock_hz: u32,
    /// Address length programmed into instruction frames
    pub address_width: AddressWidth,
    /// Disable and invalidate the CMCC around each instruction
    pub cache_bracket: bool,
    /// INTFLAG/CMCC polls before an instruction is declared stuck
    pub completion_poll_limit: u32,
}

impl Default for SamdQspiOptions {
    fn default() -> Self {
        Self {
            mck_hz: 120_000_000,
            initial_clock_hz: 4_000_000,
            address_width: AddressWidth::ThreeByte,
            cache_bracket: true,
            completion_poll_limit: 1_000_000,
        }
    }
}

impl SamdQspiOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the main clock frequency
    pub fn with_mck_hz(mut self, hz: u32) -> Self {
        self.mck_hz = hz;
        self
    }

    /// Set the serial clock used before identification
    pub fn with_initial_clock_hz(mut self, hz: u32) -> Self {
        self.initial_clock_hz = hz;
        self
    }

    /// Set the address width
    pub fn with_address_width(mut self, width: AddressWidth) -> Self {
        self.address_width = width;
        self
    }

    /// Enable or disable the cache bracket
    pub fn with_cache_bracket(mut self, enabled: bool) -> Self {
        self.cache_bracket = enabled;
        self
    }

    /// Set the completion poll budget
    pub fn with_completion_poll_limit(mut self, polls: u32) -> Self {
        self.completion_poll_limit = polls;
        self
    }

    /// Parse options from key-value pairs
    ///
    /// Supported options:
    /// - mck=<hz>
    /// - spispeed=<hz>
    /// - addr=24|32
    /// - cache=on|off
    /// - polls=<count>
    pub fn from_options(options: &[(&str, &str)]) -> Result<Self> {
        let mut opts = Self::default();

        for (key, value) in options {
            match *key {
                "mck" | "mck_hz" => {
                    opts.mck_hz = parse_u32(value)
                        .ok_or(SamdQspiError::InvalidOption("mck must be a frequency in Hz"))?;
                }
                "spispeed" | "initial_clock_hz" => {
                    opts.initial_clock_hz = parse_u32(value).ok_or(
                        SamdQspiError::InvalidOption("spispeed must be a frequency in Hz"),
                    )?;
                }
                "addr" | "address_width" => {
                    opts.address_width = parse_u32(value)
                        .and_then(AddressWidth::from_bits)
                        .ok_or(SamdQspiError::InvalidOption("addr must be 24 or 32"))?;
                }
                "cache" => {
                    opts.cache_bracket = match *value {
                        "on" | "1" | "true" => true,
                        "off" | "0" | "false" => false,
                        _ => return Err(SamdQspiError::InvalidOption("cache must be on or off")),
                    };
                }
                "polls" => {
                    opts.completion_poll_limit = parse_u32(value)
                        .ok_or(SamdQspiError::InvalidOption("polls must be a number"))?;
                }
                _ => {
                    log::warn!("Unknown SAMD QSPI option: {}={}", key, value);
                }
            }
        }

        Ok(opts)
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Some(mhz) = value.strip_suffix("M") {
        return mhz.parse::<u32>().ok()?.checked_mul(1_000_000);
    }
    if let Some(hex) = value.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16).ok();
    }
    value.parse().ok()
}
