//! Recording transport used by the unit tests in this crate

use std::collections::VecDeque;
use std::vec;
use std::vec::Vec;

use crate::error::{Error, Result};
use crate::frame::{encode_request, FrameWord};
use crate::spi::{opcodes, AddressWidth, CachePolicy, DataPhase, TransferRequest};
use crate::transport::QspiTransport;

/// One executed instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub opcode: u8,
    pub address: Option<u32>,
    pub frame: FrameWord,
    pub tx: Vec<u8>,
    pub rx_len: usize,
    pub cache: CachePolicy,
}

/// Answers register reads from canned values and memory reads from a
/// backing buffer; everything else is only recorded.
pub struct MockTransport {
    pub log: Vec<Recorded>,
    pub jedec: [u8; 3],
    pub sr1: u8,
    pub sr2: u8,
    /// Values returned by successive RDSR reads before falling back to `sr1`
    pub sr1_sequence: VecDeque<u8>,
    pub memory: Vec<u8>,
    pub address_width: AddressWidth,
    pub clock_hz: Option<u32>,
    pub delays: Vec<u32>,
    pub fail_opcode: Option<u8>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            jedec: [0xC8, 0x40, 0x15],
            sr1: 0,
            sr2: 0,
            sr1_sequence: VecDeque::new(),
            memory: vec![0xFF; 4096],
            address_width: AddressWidth::ThreeByte,
            clock_hz: None,
            delays: Vec::new(),
            fail_opcode: None,
        }
    }

    pub fn opcodes(&self) -> Vec<u8> {
        self.log.iter().map(|r| r.opcode).collect()
    }
}

impl QspiTransport for MockTransport {
    fn execute(&mut self, request: &mut TransferRequest<'_>) -> Result<()> {
        let frame = encode_request(request, self.address_width);
        let opcode = request.instruction.opcode;
        if self.fail_opcode == Some(opcode) {
            return Err(Error::TransferFailed);
        }

        let address = request.instruction.has_address.then_some(request.address);
        let (tx, rx_len) = match &request.data {
            DataPhase::None => (Vec::new(), 0),
            DataPhase::Read(buf) => (Vec::new(), buf.len()),
            DataPhase::Write(data) => (data.to_vec(), 0),
        };
        self.log.push(Recorded {
            opcode,
            address,
            frame,
            tx,
            rx_len,
            cache: request.cache,
        });

        if let DataPhase::Read(buf) = &mut request.data {
            match opcode {
                opcodes::RDID => {
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = self.jedec[i % 3];
                    }
                }
                opcodes::RDSR => {
                    let value = self.sr1_sequence.pop_front().unwrap_or(self.sr1);
                    buf.fill(value);
                }
                opcodes::RDSR2 => buf.fill(self.sr2),
                _ => {
                    let start = request.address as usize;
                    let end = start + buf.len();
                    if end > self.memory.len() {
                        return Err(Error::AddressOutOfBounds);
                    }
                    buf.copy_from_slice(&self.memory[start..end]);
                }
            }
        }
        Ok(())
    }

    fn address_width(&self) -> AddressWidth {
        self.address_width
    }

    fn set_address_width(&mut self, width: AddressWidth) {
        self.address_width = width;
    }

    fn set_clock_speed(&mut self, hz: u32) -> Result<()> {
        if hz == 0 {
            return Err(Error::InvalidClock);
        }
        self.clock_hz = Some(hz);
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.delays.push(us);
    }
}
