//! qspiflash-core - Core library for QSPI NOR flash drivers
//!
//! This crate provides the platform-independent parts of a QSPI serial NOR
//! flash driver: instruction descriptors, the instruction frame encoder, the
//! transport trait implemented by each controller crate, the opcode-level
//! command facade and the device model that identifies, configures and
//! drives an attached part. It is `no_std` for use in firmware.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`) and the
//!   RON device table loader
//! - `alloc` - Enable heap allocation (owned device names)
//! - `builtin-devices` - Compile in the table of known parts (default)
//!
//! # Example
//!
//! ```ignore
//! use qspiflash_core::flash::QspiFlash;
//!
//! fn mount<T: qspiflash_core::transport::QspiTransport>(transport: T) {
//!     let mut flash = QspiFlash::new(transport);
//!     match flash.begin() {
//!         Ok(device) => log::info!("{}: {} bytes", device.name, device.total_size),
//!         Err(e) => log::error!("no flash: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
pub mod frame;
pub mod protocol;
pub mod spi;
pub mod transport;

pub use error::{Error, Result};
