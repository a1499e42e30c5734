//! qspiflash-samd - SAMD51 QSPI controller transport
//!
//! Drives the QSPI peripheral of Microchip SAMD51/SAME5x parts in serial
//! memory mode. Register and data-window access goes through the
//! [`RegisterBlock`] trait so the instruction sequencing can be exercised
//! off-target.
//!
//! # Example
//!
//! ```ignore
//! use qspiflash_core::flash::QspiFlash;
//! use qspiflash_samd::{MmioRegisters, SamdQspi, SamdQspiOptions};
//!
//! let regs = unsafe { MmioRegisters::samd51() };
//! let qspi = SamdQspi::new(regs, SamdQspiOptions::default())?;
//! let mut flash = QspiFlash::new(qspi);
//! flash.begin()?;
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]

mod error;
mod options;
pub mod regs;
mod transport;

pub use error::{Result, SamdQspiError};
pub use options::SamdQspiOptions;
pub use regs::{MmioRegisters, Register, RegisterBlock};
pub use transport::SamdQspi;
