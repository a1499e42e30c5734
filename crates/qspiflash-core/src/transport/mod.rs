//! QSPI transport abstraction
//!
//! One implementation exists per target controller; each lives in its own
//! crate and is selected at build time.

mod traits;

#[cfg(all(test, feature = "std"))]
pub(crate) mod mock;

pub use traits::QspiTransport;
