//! Native memory bridge.
//!
//! The decoder module owns a flat 32-bit address space (a WASM linear memory
//! or a C heap). Everything that crosses the call boundary is either a byte
//! range copied in or out of that space, or an [`Addr`] pointing into it.
//! A null native pointer is `Option::<Addr>::None`.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

use tracing::trace;

use crate::error::MemoryError;

/// Allocation granularity of [`LinearMemory`].
pub const ALIGN: usize = 8;

/// First usable heap address. Everything below is reserved so that no
/// allocation can ever be handed out at address 0.
pub const HEAP_BASE: u32 = ALIGN as u32;

/// A non-null address in native linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(NonZeroU32);

impl Addr {
    /// Wrap a raw native pointer; 0 (null) yields `None`.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Address `offset` bytes further on, if it still fits in 32 bits.
    pub fn checked_add(self, offset: usize) -> Option<Self> {
        let offset = u32::try_from(offset).ok()?;
        self.get().checked_add(offset).and_then(Self::new)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.get())
    }
}

/// Raw memory primitives exposed by a native module.
pub trait NativeMemory {
    /// Allocate `len` bytes. The contents are unspecified.
    fn alloc(&mut self, len: usize) -> Result<Addr, MemoryError>;

    /// Release an allocation previously returned by [`alloc`](Self::alloc).
    fn free(&mut self, addr: Addr) -> Result<(), MemoryError>;

    /// Copy `dst.len()` bytes starting at `addr` out of native memory.
    fn read(&self, addr: Addr, dst: &mut [u8]) -> Result<(), MemoryError>;

    /// Copy `src` into native memory starting at `addr`.
    fn write(&mut self, addr: Addr, src: &[u8]) -> Result<(), MemoryError>;

    /// Whether `len` bytes starting at `addr` lie inside native memory.
    fn contains(&self, addr: Addr, len: usize) -> bool;
}

/// A flat byte address space with a first-fit allocator.
///
/// Allocations are tracked, so freeing an address twice (or one that was
/// never handed out) is reported instead of corrupting the heap.
#[derive(Debug)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    /// Live allocations: start address -> reserved length.
    allocations: BTreeMap<u32, usize>,
}

impl LinearMemory {
    /// Create a linear memory of `size` bytes (including the reserved null page).
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size.max(HEAP_BASE as usize)],
            allocations: BTreeMap::new(),
        }
    }

    /// Total size of the address space in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Number of allocations not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.allocations.len()
    }

    /// Bytes currently reserved by live allocations.
    pub fn allocated_bytes(&self) -> usize {
        self.allocations.values().sum()
    }

    /// Whether `addr` is the start of a live allocation.
    pub fn is_allocated(&self, addr: Addr) -> bool {
        self.allocations.contains_key(&addr.get())
    }

    /// Borrow `len` bytes at `addr`.
    pub fn slice(&self, addr: Addr, len: usize) -> Result<&[u8], MemoryError> {
        let range = self.range(addr, len)?;
        Ok(&self.bytes[range])
    }

    /// Mutably borrow `len` bytes at `addr`, e.g. to hand a native read buffer
    /// to a pull callback.
    pub fn slice_mut(&mut self, addr: Addr, len: usize) -> Result<&mut [u8], MemoryError> {
        let range = self.range(addr, len)?;
        Ok(&mut self.bytes[range])
    }

    fn range(&self, addr: Addr, len: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let start = addr.get() as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(MemoryError::OutOfBounds { addr, len }),
        }
    }

    fn align_up(value: usize) -> Option<usize> {
        value.checked_add(ALIGN - 1).map(|v| v & !(ALIGN - 1))
    }
}

impl NativeMemory for LinearMemory {
    fn alloc(&mut self, len: usize) -> Result<Addr, MemoryError> {
        let out_of_memory = MemoryError::OutOfMemory { requested: len };
        // Zero-sized requests still get a distinct address.
        let reserved = Self::align_up(len.max(1)).ok_or(out_of_memory.clone())?;
        let mut cursor = HEAP_BASE as usize;

        for (&start, &size) in &self.allocations {
            if (start as usize).saturating_sub(cursor) >= reserved {
                break;
            }
            cursor = Self::align_up(start as usize + size).ok_or(out_of_memory.clone())?;
        }

        let fits = cursor
            .checked_add(reserved)
            .map_or(false, |end| end <= self.bytes.len());
        let addr = match u32::try_from(cursor).ok().and_then(Addr::new) {
            Some(addr) if fits => addr,
            _ => return Err(out_of_memory),
        };

        self.allocations.insert(addr.get(), reserved);
        trace!(addr = %addr, len, "linear memory alloc");
        Ok(addr)
    }

    fn free(&mut self, addr: Addr) -> Result<(), MemoryError> {
        match self.allocations.remove(&addr.get()) {
            Some(len) => {
                trace!(addr = %addr, len, "linear memory free");
                Ok(())
            }
            None => Err(MemoryError::InvalidFree(addr)),
        }
    }

    fn read(&self, addr: Addr, dst: &mut [u8]) -> Result<(), MemoryError> {
        dst.copy_from_slice(self.slice(addr, dst.len())?);
        Ok(())
    }

    fn write(&mut self, addr: Addr, src: &[u8]) -> Result<(), MemoryError> {
        self.slice_mut(addr, src.len())?.copy_from_slice(src);
        Ok(())
    }

    fn contains(&self, addr: Addr, len: usize) -> bool {
        self.range(addr, len).is_ok()
    }
}
