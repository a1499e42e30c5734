//! Per-call transfer requests

use super::InstructionDescriptor;

/// Data phase of a transfer and the caller buffer backing it
#[derive(Debug, Default)]
pub enum DataPhase<'a> {
    /// No data phase
    #[default]
    None,
    /// Device-to-host data, written into the buffer
    Read(&'a mut [u8]),
    /// Host-to-device data, taken from the buffer
    Write(&'a [u8]),
}

impl DataPhase<'_> {
    /// Number of bytes moved by this phase
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Read(buf) => buf.len(),
            Self::Write(data) => data.len(),
        }
    }

    /// True if no bytes are moved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of caller-supplied transmit bytes
    pub fn tx_len(&self) -> usize {
        match self {
            Self::Write(data) => data.len(),
            _ => 0,
        }
    }
}

/// Cache handling around the memory-mapped window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Disable and invalidate the cache before the transfer, re-enable after
    #[default]
    Bracket,
    /// The caller is bracketing a run of back-to-back transfers itself
    CallerManaged,
}

/// One instruction plus the address and buffer for this call
///
/// The lifetime parameter `'a` ties the request to the buffer it references.
#[derive(Debug)]
pub struct TransferRequest<'a> {
    /// The instruction to execute
    pub instruction: InstructionDescriptor,
    /// Address (ignored unless `instruction.has_address`)
    pub address: u32,
    /// Data phase
    pub data: DataPhase<'a>,
    /// Cache handling
    pub cache: CachePolicy,
}

impl<'a> TransferRequest<'a> {
    /// A request with no address and no data
    pub fn new(instruction: InstructionDescriptor) -> Self {
        Self {
            instruction,
            address: 0,
            data: DataPhase::None,
            cache: CachePolicy::Bracket,
        }
    }

    /// A request that reads into `buf`
    pub fn read(instruction: InstructionDescriptor, buf: &'a mut [u8]) -> Self {
        Self {
            data: DataPhase::Read(buf),
            ..Self::new(instruction)
        }
    }

    /// A request that transmits `data`
    pub fn write(instruction: InstructionDescriptor, data: &'a [u8]) -> Self {
        Self {
            data: DataPhase::Write(data),
            ..Self::new(instruction)
        }
    }

    /// Set the address
    pub fn with_address(mut self, address: u32) -> Self {
        self.address = address;
        self
    }

    /// Set the cache policy
    pub fn with_cache_policy(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    /// Number of bytes in the data phase
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the request moves no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
