//! Offset validation shared by the register block and the raw interface.
//!
//! These helpers are useful when implementing a custom
//! [`RegisterRegion`](crate::regdev::RegisterRegion) that needs to reason
//! about word offsets inside a span.

use crate::regdev::RegError;

/// Size of one register in bytes.
pub const WORD_SIZE: usize = 4;

/// Validates a byte offset for a single word access inside `span` bytes.
///
/// # Errors
/// * [`RegError::OutOfRange`] - if `offset >= span`
/// * [`RegError::Misaligned`] - if `offset` is not a multiple of [`WORD_SIZE`]
///
/// # Example
/// ```
/// use embedded_regdev::regdev::{RegError, helpers::word_offset};
///
/// assert_eq!(word_offset(8, 16), Ok(8));
/// assert_eq!(word_offset(16, 16), Err(RegError::OutOfRange));
/// assert_eq!(word_offset(6, 16), Err(RegError::Misaligned));
/// ```
pub fn word_offset(offset: usize, span: usize) -> Result<usize, RegError> {
    if offset >= span {
        return Err(RegError::OutOfRange);
    }
    if offset % WORD_SIZE != 0 {
        return Err(RegError::Misaligned);
    }
    Ok(offset)
}

/// Resolves a raw-interface file position to a word offset.
///
/// Returns `Ok(None)` when `pos` is at or past the end of the span, which the
/// raw interface reports as a zero-length transfer rather than an error.
///
/// # Errors
/// * [`RegError::InvalidOffset`] - if `pos` is negative
/// * [`RegError::Misaligned`] - if `pos` is inside the span but not word aligned
pub fn file_position(pos: i64, span: usize) -> Result<Option<usize>, RegError> {
    if pos < 0 {
        return Err(RegError::InvalidOffset);
    }
    let offset = match usize::try_from(pos) {
        Ok(offset) if offset < span => offset,
        _ => return Ok(None),
    };
    word_offset(offset, span).map(Some)
}

/// Returns true if `span` can back a register block.
pub fn valid_span(span: usize) -> bool {
    span > 0 && span % WORD_SIZE == 0
}

#[test]
fn word_offset_edge_cases() {
    // First and last word
    assert_eq!(word_offset(0, 16), Ok(0));
    assert_eq!(word_offset(12, 16), Ok(12));

    // One past the end, and far past
    assert_eq!(word_offset(16, 16), Err(RegError::OutOfRange));
    assert_eq!(word_offset(usize::MAX, 16), Err(RegError::OutOfRange));

    // Range is checked before alignment
    assert_eq!(word_offset(17, 16), Err(RegError::OutOfRange));
    assert_eq!(word_offset(1, 16), Err(RegError::Misaligned));
    assert_eq!(word_offset(15, 16), Err(RegError::Misaligned));
}

#[test]
fn file_position_edge_cases() {
    assert_eq!(file_position(-4, 16), Err(RegError::InvalidOffset));
    assert_eq!(file_position(0, 16), Ok(Some(0)));
    assert_eq!(file_position(4, 16), Ok(Some(4)));
    assert_eq!(file_position(2, 16), Err(RegError::Misaligned));

    // End of range is not an error, aligned or not
    assert_eq!(file_position(16, 16), Ok(None));
    assert_eq!(file_position(18, 16), Ok(None));
    assert_eq!(file_position(i64::MAX, 16), Ok(None));
}

#[test]
fn valid_span_requires_whole_words() {
    assert!(valid_span(4));
    assert!(valid_span(16));
    assert!(!valid_span(0));
    assert!(!valid_span(10));
}
