use critical_section::CriticalSection;

use crate::regdev::{RegError, helpers::word_offset, region::RegisterRegion};

/// A fixed span of 32-bit registers with bounds- and alignment-checked
/// word access.
///
/// The block owns its [`RegisterRegion`] for its whole lifetime and never
/// exposes the underlying address. Reads need only `&self`; writes also need
/// a [`CriticalSection`] token, so they can only be issued from inside
/// [`DeviceGuard::with_exclusive_access`](crate::regdev::DeviceGuard::with_exclusive_access).
#[derive(Debug)]
pub struct RegisterBlock<R: RegisterRegion> {
    region: R,
    span: usize,
}

impl<R: RegisterRegion> RegisterBlock<R> {
    pub(crate) fn new(region: R) -> Self {
        let span = region.span();
        Self { region, span }
    }

    /// Size of the block in bytes.
    pub fn span(&self) -> usize {
        self.span
    }

    /// Number of 32-bit registers in the block.
    pub fn word_count(&self) -> usize {
        self.span / crate::regdev::helpers::WORD_SIZE
    }

    /// Reads the register at `offset`.
    ///
    /// # Errors
    /// [`RegError::OutOfRange`] or [`RegError::Misaligned`].
    pub fn read_word(&self, offset: usize) -> Result<u32, RegError> {
        let offset = word_offset(offset, self.span)?;
        Ok(self.region.load(offset))
    }

    /// Writes `value` to the register at `offset`.
    ///
    /// # Errors
    /// [`RegError::OutOfRange`] or [`RegError::Misaligned`]; nothing is
    /// written in either case.
    pub fn write_word(
        &self,
        _cs: CriticalSection<'_>,
        offset: usize,
        value: u32,
    ) -> Result<(), RegError> {
        let offset = word_offset(offset, self.span)?;
        self.region.store(offset, value);
        Ok(())
    }

    pub(crate) fn into_region(self) -> R {
        self.region
    }
}
