#![allow(unsafe_code)]

use core::{
    cell::RefCell,
    ptr::NonNull,
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
};

use critical_section::Mutex;
use heapless::Vec;

use crate::regdev::{
    RegError,
    helpers::{WORD_SIZE, valid_span},
};

/// A matched hardware resource: base address and register span in bytes.
///
/// Supplied by whatever enumerates the bus (device tree, board table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub base: usize,
    pub span: usize,
}

impl Resource {
    pub const fn new(base: usize, span: usize) -> Self {
        Self { base, span }
    }
}

/// Word-granular backing store of a register block.
///
/// Implementations perform exactly one indivisible 32-bit access per call.
/// Offsets passed in are already validated against [`span`](Self::span).
pub trait RegisterRegion {
    /// Size of the region in bytes.
    fn span(&self) -> usize;
    /// Loads the word at `offset`.
    fn load(&self, offset: usize) -> u32;
    /// Stores `value` at `offset`.
    fn store(&self, offset: usize, value: u32);
}

impl<T: RegisterRegion + ?Sized> RegisterRegion for &T {
    fn span(&self) -> usize {
        (**self).span()
    }

    fn load(&self, offset: usize) -> u32 {
        (**self).load(offset)
    }

    fn store(&self, offset: usize, value: u32) {
        (**self).store(offset, value)
    }
}

/// Claims and maps a [`Resource`] into a [`RegisterRegion`].
pub trait RegionMapper {
    type Region: RegisterRegion;

    /// Maps the resource, failing with [`RegError::MapFailed`] if the range
    /// cannot be claimed.
    fn map(&self, resource: Resource) -> Result<Self::Region, RegError>;
}

/// Volatile memory-mapped register window.
#[derive(Debug)]
pub struct Mmio {
    base: NonNull<u32>,
    span: usize,
}

// The window is plain device memory; every access is a single volatile word.
unsafe impl Send for Mmio {}
unsafe impl Sync for Mmio {}

impl Mmio {
    /// Creates a window over `span` bytes starting at `base`.
    ///
    /// # Safety
    /// `base` must point to `span` bytes of mapped device memory, word aligned,
    /// valid for volatile reads and writes for the lifetime of the window, and
    /// not handed out to any other window at the same time.
    pub unsafe fn new(base: NonNull<u32>, span: usize) -> Self {
        Self { base, span }
    }
}

impl RegisterRegion for Mmio {
    fn span(&self) -> usize {
        self.span
    }

    fn load(&self, offset: usize) -> u32 {
        debug_assert!(offset + WORD_SIZE <= self.span);
        unsafe { self.base.add(offset / WORD_SIZE).read_volatile() }
    }

    fn store(&self, offset: usize, value: u32) {
        debug_assert!(offset + WORD_SIZE <= self.span);
        unsafe { self.base.add(offset / WORD_SIZE).write_volatile(value) }
    }
}

/// Number of ranges one [`MmioMapper`] can have mapped at once.
pub const MMIO_CLAIM_SLOTS: usize = 8;

/// Maps resources whose physical address is directly usable (no MMU, or an
/// identity mapping set up by the platform).
///
/// The mapper keeps a table of the ranges it has handed out. A request that
/// overlaps a live window fails with [`RegError::MapFailed`], and the range is
/// released when its [`MmioWindow`] drops. Map through `&MmioMapper`, the
/// same way a [`SimulatedRegisters`] bank is mapped through a reference.
pub struct MmioMapper {
    claims: Mutex<RefCell<Vec<Resource, MMIO_CLAIM_SLOTS>>>,
}

impl core::fmt::Debug for MmioMapper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MmioMapper")
            .field("claimed", &self.claimed())
            .finish()
    }
}

impl MmioMapper {
    /// # Safety
    /// Every [`Resource`] later passed to [`RegionMapper::map`] must describe
    /// identity-mapped device memory that nothing outside this mapper
    /// accesses while the returned window is alive.
    pub const unsafe fn new() -> Self {
        Self {
            claims: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Number of ranges currently mapped.
    pub fn claimed(&self) -> usize {
        critical_section::with(|cs| self.claims.borrow(cs).borrow().len())
    }

    fn claim(&self, resource: Resource) -> Result<(), RegError> {
        let end = resource
            .base
            .checked_add(resource.span)
            .ok_or(RegError::MapFailed)?;

        critical_section::with(|cs| {
            let mut claims = self.claims.borrow(cs).borrow_mut();
            let busy = claims
                .iter()
                .any(|held| resource.base < held.base + held.span && held.base < end);
            if busy {
                return Err(RegError::MapFailed);
            }
            claims.push(resource).map_err(|_| RegError::MapFailed)
        })
    }

    fn release(&self, resource: Resource) {
        critical_section::with(|cs| {
            let mut claims = self.claims.borrow(cs).borrow_mut();
            if let Some(i) = claims.iter().position(|held| *held == resource) {
                claims.swap_remove(i);
            }
        })
    }
}

impl<'a> RegionMapper for &'a MmioMapper {
    type Region = MmioWindow<'a>;

    fn map(&self, resource: Resource) -> Result<MmioWindow<'a>, RegError> {
        if resource.base % WORD_SIZE != 0 || !valid_span(resource.span) {
            return Err(RegError::MapFailed);
        }
        let base = NonNull::new(resource.base as *mut u32).ok_or(RegError::MapFailed)?;
        self.claim(resource).inspect_err(|_| {
            log::warn!(
                "range {:#x}+{:#x} is already mapped",
                resource.base,
                resource.span
            )
        })?;

        Ok(MmioWindow {
            mmio: unsafe { Mmio::new(base, resource.span) },
            resource,
            mapper: *self,
        })
    }
}

/// A range claimed from an [`MmioMapper`]; released on drop.
#[derive(Debug)]
pub struct MmioWindow<'a> {
    mmio: Mmio,
    resource: Resource,
    mapper: &'a MmioMapper,
}

impl MmioWindow<'_> {
    pub fn resource(&self) -> Resource {
        self.resource
    }
}

impl RegisterRegion for MmioWindow<'_> {
    fn span(&self) -> usize {
        self.mmio.span()
    }

    fn load(&self, offset: usize) -> u32 {
        self.mmio.load(offset)
    }

    fn store(&self, offset: usize, value: u32) {
        self.mmio.store(offset, value)
    }
}

impl Drop for MmioWindow<'_> {
    fn drop(&mut self) {
        self.mapper.release(self.resource);
    }
}

/// Atomic-backed stand-in for a block of `WORDS` hardware registers.
///
/// Mapping it through [`RegionMapper`] claims it exclusively until the
/// returned [`SimWindow`] is dropped. [`peek`](Self::peek) and
/// [`poke`](Self::poke) give the hardware side's view of the registers.
#[derive(Debug)]
pub struct SimulatedRegisters<const WORDS: usize> {
    words: [AtomicU32; WORDS],
    claimed: AtomicBool,
}

impl<const WORDS: usize> SimulatedRegisters<WORDS> {
    pub const SPAN: usize = WORDS * WORD_SIZE;

    pub const fn new() -> Self {
        Self {
            words: [const { AtomicU32::new(0) }; WORDS],
            claimed: AtomicBool::new(false),
        }
    }

    /// Reads a register as the hardware sees it. Panics on a bad offset.
    pub fn peek(&self, offset: usize) -> u32 {
        self.words[offset / WORD_SIZE].load(Ordering::SeqCst)
    }

    /// Sets a register from the hardware side. Panics on a bad offset.
    pub fn poke(&self, offset: usize, value: u32) {
        self.words[offset / WORD_SIZE].store(value, Ordering::SeqCst)
    }

    /// Returns true while a window over these registers is mapped.
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

impl<const WORDS: usize> Default for SimulatedRegisters<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive mapping of a [`SimulatedRegisters`] bank.
#[derive(Debug)]
pub struct SimWindow<'a, const WORDS: usize> {
    regs: &'a SimulatedRegisters<WORDS>,
}

impl<const WORDS: usize> RegisterRegion for SimWindow<'_, WORDS> {
    fn span(&self) -> usize {
        SimulatedRegisters::<WORDS>::SPAN
    }

    fn load(&self, offset: usize) -> u32 {
        self.regs.peek(offset)
    }

    fn store(&self, offset: usize, value: u32) {
        self.regs.poke(offset, value)
    }
}

impl<const WORDS: usize> Drop for SimWindow<'_, WORDS> {
    fn drop(&mut self) {
        self.regs.claimed.store(false, Ordering::SeqCst);
    }
}

impl<'a, const WORDS: usize> RegionMapper for &'a SimulatedRegisters<WORDS> {
    type Region = SimWindow<'a, WORDS>;

    fn map(&self, resource: Resource) -> Result<SimWindow<'a, WORDS>, RegError> {
        if resource.base % WORD_SIZE != 0 || resource.span != SimulatedRegisters::<WORDS>::SPAN {
            return Err(RegError::MapFailed);
        }
        if self.claimed.swap(true, Ordering::SeqCst) {
            return Err(RegError::MapFailed);
        }
        Ok(SimWindow { regs: *self })
    }
}
