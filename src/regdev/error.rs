/// Errors that can occur while accessing a register device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegError {
    /// Offset lies outside the addressable span.
    OutOfRange,
    /// Offset is not a multiple of the word size.
    Misaligned,
    /// Raw-interface position is negative.
    InvalidOffset,
    /// Named interface was given an unregistered attribute.
    UnknownName,
    /// Fewer or more bytes were supplied than one word transfer needs.
    TransferIncomplete,
    /// Address range could not be claimed or mapped, or the bound device is
    /// not the kind the caller expected.
    MapFailed,
    /// Attribute text could not be parsed into the attribute's domain.
    ParseFailed,
    /// Attribute backend could not be reached.
    Unavailable,
}

impl core::fmt::Display for RegError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RegError::OutOfRange => write!(f, "offset outside the register span"),
            RegError::Misaligned => write!(f, "offset is not word aligned"),
            RegError::InvalidOffset => write!(f, "negative file position"),
            RegError::UnknownName => write!(f, "unknown attribute name"),
            RegError::TransferIncomplete => write!(f, "transfer is not exactly one word"),
            RegError::MapFailed => write!(f, "register range could not be mapped for this device"),
            RegError::ParseFailed => write!(f, "attribute value could not be parsed"),
            RegError::Unavailable => write!(f, "attribute backend unavailable"),
        }
    }
}

impl core::error::Error for RegError {}
