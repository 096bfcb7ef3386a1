use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};

use crate::regdev::{RegError, block::RegisterBlock, region::RegisterRegion};

/// Mutual-exclusion gate in front of a [`RegisterBlock`].
///
/// Every mutating access goes through [`with_exclusive_access`], which runs
/// inside a critical section. Reads may bypass the gate since a single word
/// access is indivisible at the region level.
///
/// [`with_exclusive_access`]: Self::with_exclusive_access
pub struct DeviceGuard<R: RegisterRegion> {
    block: RegisterBlock<R>,
    writes: Mutex<Cell<u32>>,
}

impl<R: RegisterRegion> core::fmt::Debug for DeviceGuard<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceGuard")
            .field("span", &self.block.span())
            .finish_non_exhaustive()
    }
}

/// Register access handed to a closure running under the guard.
pub struct Exclusive<'a, R: RegisterRegion> {
    block: &'a RegisterBlock<R>,
    writes: &'a Cell<u32>,
    cs: CriticalSection<'a>,
}

impl<'a, R: RegisterRegion> core::fmt::Debug for Exclusive<'a, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Exclusive").finish_non_exhaustive()
    }
}

impl<'a, R: RegisterRegion> Exclusive<'a, R> {
    pub fn read_word(&self, offset: usize) -> Result<u32, RegError> {
        self.block.read_word(offset)
    }

    pub fn write_word(&mut self, offset: usize, value: u32) -> Result<(), RegError> {
        self.block.write_word(self.cs, offset, value)?;
        self.writes.set(self.writes.get().wrapping_add(1));
        Ok(())
    }
}

impl<R: RegisterRegion> DeviceGuard<R> {
    pub(crate) fn new(block: RegisterBlock<R>) -> Self {
        Self {
            block,
            writes: Mutex::new(Cell::new(0)),
        }
    }

    /// Runs `f` with exclusive access to the block.
    ///
    /// The lock is released on every exit path and `f`'s result is returned
    /// unchanged.
    pub fn with_exclusive_access<T>(
        &self,
        f: impl FnOnce(&mut Exclusive<'_, R>) -> Result<T, RegError>,
    ) -> Result<T, RegError> {
        critical_section::with(|cs| {
            let mut access = Exclusive {
                block: &self.block,
                writes: self.writes.borrow(cs),
                cs,
            };
            f(&mut access)
        })
    }

    /// Unlocked single-word read.
    pub fn read_word(&self, offset: usize) -> Result<u32, RegError> {
        self.block.read_word(offset)
    }

    /// Number of register writes committed through the guard.
    pub fn write_count(&self) -> u32 {
        critical_section::with(|cs| self.writes.borrow(cs).get())
    }

    pub fn span(&self) -> usize {
        self.block.span()
    }

    pub(crate) fn into_block(self) -> RegisterBlock<R> {
        self.block
    }
}
