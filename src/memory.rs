//! Guest memory access
//!
//! The process lifecycle only needs to copy small fixed-layout values out
//! to guest addresses. `GuestMemory` is the seam to the emulator's real
//! address space; `FlatMemory` is a bounds-checked byte window used by the
//! binary and the tests.

use parking_lot::Mutex;

/// 32-bit guest virtual address
pub type GuestAddr = u32;

/// A guest access touched memory that is not mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("guest access of {len} bytes at {addr:#x} is not mapped")]
pub struct MemoryFault {
    pub addr: GuestAddr,
    pub len: usize,
}

pub trait GuestMemory: Send + Sync {
    fn read_bytes(&self, addr: GuestAddr, buf: &mut [u8]) -> Result<(), MemoryFault>;
    fn write_bytes(&self, addr: GuestAddr, data: &[u8]) -> Result<(), MemoryFault>;
}

/// A value with a fixed little-endian guest layout.
pub trait GuestValue: Sized {
    const SIZE: usize;

    fn encode(&self, out: &mut Vec<u8>);
    fn decode(bytes: &[u8]) -> Self;
}

impl GuestValue for u32 {
    const SIZE: usize = 4;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[..4]);
        u32::from_le_bytes(raw)
    }
}

impl GuestValue for i32 {
    const SIZE: usize = 4;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        u32::decode(bytes) as i32
    }
}

/// Guest `struct timeval` (i386 layout)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeval {
    pub sec: u32,
    pub usec: u32,
}

impl GuestValue for Timeval {
    const SIZE: usize = 8;

    fn encode(&self, out: &mut Vec<u8>) {
        self.sec.encode(out);
        self.usec.encode(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            sec: u32::decode(&bytes[0..4]),
            usec: u32::decode(&bytes[4..8]),
        }
    }
}

/// Guest `struct rusage` (i386 layout)
///
/// Resource accounting is not tracked, so the reap path always reports
/// `Rusage::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rusage {
    pub utime: Timeval,
    pub stime: Timeval,
    pub maxrss: u32,
    pub ixrss: u32,
    pub idrss: u32,
    pub isrss: u32,
    pub minflt: u32,
    pub majflt: u32,
    pub nswap: u32,
    pub inblock: u32,
    pub oublock: u32,
    pub msgsnd: u32,
    pub msgrcv: u32,
    pub nsignals: u32,
    pub nvcsw: u32,
    pub nivcsw: u32,
}

impl Rusage {
    fn counters(&self) -> [u32; 14] {
        [
            self.maxrss,
            self.ixrss,
            self.idrss,
            self.isrss,
            self.minflt,
            self.majflt,
            self.nswap,
            self.inblock,
            self.oublock,
            self.msgsnd,
            self.msgrcv,
            self.nsignals,
            self.nvcsw,
            self.nivcsw,
        ]
    }
}

impl GuestValue for Rusage {
    const SIZE: usize = 2 * Timeval::SIZE + 14 * 4;

    fn encode(&self, out: &mut Vec<u8>) {
        self.utime.encode(out);
        self.stime.encode(out);
        for counter in self.counters() {
            counter.encode(out);
        }
    }

    fn decode(bytes: &[u8]) -> Self {
        let field = |idx: usize| u32::decode(&bytes[16 + idx * 4..]);
        Self {
            utime: Timeval::decode(&bytes[0..8]),
            stime: Timeval::decode(&bytes[8..16]),
            maxrss: field(0),
            ixrss: field(1),
            idrss: field(2),
            isrss: field(3),
            minflt: field(4),
            majflt: field(5),
            nswap: field(6),
            inblock: field(7),
            oublock: field(8),
            msgsnd: field(9),
            msgrcv: field(10),
            nsignals: field(11),
            nvcsw: field(12),
            nivcsw: field(13),
        }
    }
}

/// Copy `value` to guest memory at `addr`.
pub fn user_put<T: GuestValue>(
    mem: &dyn GuestMemory,
    addr: GuestAddr,
    value: &T,
) -> Result<(), MemoryFault> {
    let mut bytes = Vec::with_capacity(T::SIZE);
    value.encode(&mut bytes);
    mem.write_bytes(addr, &bytes)
}

/// Copy a value of type `T` out of guest memory at `addr`.
pub fn user_get<T: GuestValue>(mem: &dyn GuestMemory, addr: GuestAddr) -> Result<T, MemoryFault> {
    let mut bytes = vec![0u8; T::SIZE];
    mem.read_bytes(addr, &mut bytes)?;
    Ok(T::decode(&bytes))
}

/// Guest memory backed by one contiguous host buffer mapped at `base`.
pub struct FlatMemory {
    base: GuestAddr,
    bytes: Mutex<Vec<u8>>,
}

impl FlatMemory {
    /// Map `len` zeroed bytes at `base`. The zero page is never mapped, so
    /// a window starting at 0 begins at the first byte after it.
    pub fn new(base: GuestAddr, len: usize) -> Self {
        let base = base.max(1);
        Self {
            base,
            bytes: Mutex::new(vec![0u8; len]),
        }
    }

    pub fn base(&self) -> GuestAddr {
        self.base
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn offset(&self, addr: GuestAddr, len: usize, mapped: usize) -> Result<usize, MemoryFault> {
        let fault = MemoryFault { addr, len };
        let offset = addr.checked_sub(self.base).ok_or(fault)? as usize;
        let end = offset.checked_add(len).ok_or(fault)?;
        if end > mapped {
            return Err(fault);
        }
        Ok(offset)
    }
}

impl GuestMemory for FlatMemory {
    fn read_bytes(&self, addr: GuestAddr, buf: &mut [u8]) -> Result<(), MemoryFault> {
        let bytes = self.bytes.lock();
        let offset = self.offset(addr, buf.len(), bytes.len())?;
        buf.copy_from_slice(&bytes[offset..offset + buf.len()]);
        Ok(())
    }

    fn write_bytes(&self, addr: GuestAddr, data: &[u8]) -> Result<(), MemoryFault> {
        let mut bytes = self.bytes.lock();
        let offset = self.offset(addr, data.len(), bytes.len())?;
        bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}
