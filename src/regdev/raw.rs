use crate::regdev::{RegError, driver::DualInterfaceDriver, region::RegisterRegion};

/// Seek origin for [`RawPort::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Start(u64),
    Current(i64),
    /// Relative to the end of the register span.
    End(i64),
}

/// An open handle on a device's raw interface.
///
/// Like a file descriptor on the device node: each handle keeps its own
/// position, and [`read`](Self::read)/[`write`](Self::write) advance it by
/// the number of bytes moved, so repeated calls walk the block word by word
/// and then report end of range with `Ok(0)`.
pub struct RawPort<'a, R: RegisterRegion> {
    driver: &'a DualInterfaceDriver<R>,
    pos: i64,
}

impl<'a, R: RegisterRegion> core::fmt::Debug for RawPort<'a, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawPort").field("pos", &self.pos).finish_non_exhaustive()
    }
}

impl<'a, R: RegisterRegion> RawPort<'a, R> {
    pub(crate) fn new(driver: &'a DualInterfaceDriver<R>) -> Self {
        Self { driver, pos: 0 }
    }

    pub fn position(&self) -> i64 {
        self.pos
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, RegError> {
        let n = self.driver.read_at(self.pos, buf)?;
        self.pos += n as i64;
        Ok(n)
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize, RegError> {
        let n = self.driver.write_at(self.pos, data)?;
        self.pos += n as i64;
        Ok(n)
    }

    /// Moves the position. Positions past the end are allowed and read as
    /// end of range.
    ///
    /// # Errors
    /// [`RegError::InvalidOffset`] if the new position would be negative or
    /// overflow; the position is left unchanged.
    pub fn seek(&mut self, to: SeekFrom) -> Result<i64, RegError> {
        let new = match to {
            SeekFrom::Start(pos) => i64::try_from(pos).ok(),
            SeekFrom::Current(delta) => self.pos.checked_add(delta),
            SeekFrom::End(delta) => i64::try_from(self.driver.span())
                .ok()
                .and_then(|end| end.checked_add(delta)),
        };

        match new {
            Some(pos) if pos >= 0 => {
                self.pos = pos;
                Ok(pos)
            }
            _ => Err(RegError::InvalidOffset),
        }
    }
}
