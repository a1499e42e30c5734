//! Transport trait definitions

use crate::error::Result;
use crate::spi::{AddressWidth, TransferRequest};

/// A QSPI controller that can execute one instruction at a time
///
/// Implementations are fully synchronous: [`QspiTransport::execute`] does not
/// return until the controller reports the end of the instruction, and no
/// partially completed transfer is ever visible to the caller.
///
/// ## Execution contract
///
/// For each request an implementation:
///
/// 1. Brackets the memory-mapped window with a cache disable/invalidate and
///    re-enable, unless the request's [`CachePolicy`] is `CallerManaged`
/// 2. Programs opcode, address and the frame word from
///    [`encode_request`](crate::frame::encode_request)
/// 3. Moves `request.len()` bytes between the caller buffer and the window,
///    in the direction given by the encoded transfer type
/// 4. Starts the transfer and blocks until completion
///
/// [`CachePolicy`]: crate::spi::CachePolicy
///
/// ## Example
///
/// ```ignore
/// impl QspiTransport for MyController {
///     fn execute(&mut self, request: &mut TransferRequest<'_>) -> Result<()> {
///         let frame = encode_request(request, self.address_width);
///         self.program(request.instruction.opcode, request.address, frame);
///         self.move_data(frame.transfer_type(), &mut request.data);
///         self.start_and_wait()
///     }
///     // ...
/// }
/// ```
pub trait QspiTransport {
    /// Execute a single instruction
    fn execute(&mut self, request: &mut TransferRequest<'_>) -> Result<()>;

    /// Address length currently programmed into frames
    fn address_width(&self) -> AddressWidth;

    /// Change the address length used for subsequent frames
    fn set_address_width(&mut self, width: AddressWidth);

    /// Set the serial clock frequency
    fn set_clock_speed(&mut self, hz: u32) -> Result<()>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<T: QspiTransport + ?Sized> QspiTransport for &mut T {
    fn execute(&mut self, request: &mut TransferRequest<'_>) -> Result<()> {
        (**self).execute(request)
    }

    fn address_width(&self) -> AddressWidth {
        (**self).address_width()
    }

    fn set_address_width(&mut self, width: AddressWidth) {
        (**self).set_address_width(width)
    }

    fn set_clock_speed(&mut self, hz: u32) -> Result<()> {
        (**self).set_clock_speed(hz)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

#[cfg(feature = "alloc")]
impl QspiTransport for alloc::boxed::Box<dyn QspiTransport + Send> {
    fn execute(&mut self, request: &mut TransferRequest<'_>) -> Result<()> {
        (**self).execute(request)
    }

    fn address_width(&self) -> AddressWidth {
        (**self).address_width()
    }

    fn set_address_width(&mut self, width: AddressWidth) {
        (**self).set_address_width(width)
    }

    fn set_clock_speed(&mut self, hz: u32) -> Result<()> {
        (**self).set_clock_speed(hz)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
