//! Flash device model
//!
//! This module provides [`QspiFlash`], the state machine that identifies an
//! attached NOR part and serves reads, writes and erases against it.

mod config;
mod context;
mod device;
mod operations;

pub use config::FlashConfig;
pub use context::{DeviceState, FlashSession};
pub use device::QspiFlash;
pub use operations::PageChunks;
