//! Attribute text codec.
//!
//! Values cross the named interface as unsigned integer text. Parsing accepts
//! the same forms as the kernel's `kstrtou*` helpers: an optional `+`, a
//! `0x`/`0X` prefix for hex, a leading `0` for octal, decimal otherwise, and a
//! single trailing newline. Formatting produces decimal followed by a newline.
//!
//! Values read back from a device or a plain text file are scanned more
//! leniently by [`scan_decimal`], which takes the leading decimal number and
//! ignores whatever follows.

use core::fmt::Write;

use crate::regdev::{RegError, named::ValueWidth};

/// Capacity of a formatted attribute value.
pub const ATTR_TEXT_CAP: usize = 16;

/// Formatted attribute text.
pub type AttrText = heapless::String<ATTR_TEXT_CAP>;

/// Parses attribute text into a value that fits `width`.
///
/// # Errors
/// [`RegError::ParseFailed`] if the text is empty, has stray characters, or
/// the value does not fit `width`.
///
/// # Example
/// ```
/// use embedded_regdev::regdev::{RegError, ValueWidth, text::parse_value};
///
/// assert_eq!(parse_value("320\n", ValueWidth::U32), Ok(320));
/// assert_eq!(parse_value("0x0FFF", ValueWidth::U32), Ok(0x0FFF));
/// assert_eq!(parse_value("256", ValueWidth::U8), Err(RegError::ParseFailed));
/// ```
pub fn parse_value(text: &str, width: ValueWidth) -> Result<u32, RegError> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let text = text.strip_prefix('+').unwrap_or(text);

    let (radix, digits) = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        (16, hex)
    } else if text.len() > 1 && text.starts_with('0') {
        (8, &text[1..])
    } else {
        (10, text)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RegError::ParseFailed);
    }

    let value = u32::from_str_radix(digits, radix).map_err(|_| RegError::ParseFailed)?;
    if value > width.max() {
        return Err(RegError::ParseFailed);
    }
    Ok(value)
}

/// Reads the leading unsigned decimal number of `text`, like `scanf("%u")`.
///
/// Leading whitespace and one `+` are skipped, digits are read up to the
/// first non-digit, and the rest of the text is ignored. Values too large for
/// a `u32` saturate.
///
/// # Errors
/// [`RegError::ParseFailed`] if no digit follows the optional sign.
///
/// # Example
/// ```
/// use embedded_regdev::regdev::text::scan_decimal;
///
/// assert_eq!(scan_decimal(" 010\n"), Ok(10));
/// assert_eq!(scan_decimal("2\n3\n"), Ok(2));
/// ```
pub fn scan_decimal(text: &str) -> Result<u32, RegError> {
    let text = text.trim_start();
    let text = text.strip_prefix('+').unwrap_or(text);

    let digits = text.bytes().take_while(u8::is_ascii_digit);
    let mut seen = false;
    let mut value = 0u32;
    for digit in digits {
        seen = true;
        value = value
            .saturating_mul(10)
            .saturating_add(u32::from(digit - b'0'));
    }

    if !seen {
        return Err(RegError::ParseFailed);
    }
    Ok(value)
}

/// Formats `value` as decimal text followed by a newline.
pub fn format_value(value: u32) -> AttrText {
    let mut text = AttrText::new();
    // u32::MAX is ten digits, well inside the capacity
    let _ = writeln!(text, "{value}");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kernel_style_bases() {
        assert_eq!(parse_value("0", ValueWidth::U32), Ok(0));
        assert_eq!(parse_value("42", ValueWidth::U32), Ok(42));
        assert_eq!(parse_value("+42\n", ValueWidth::U32), Ok(42));
        assert_eq!(parse_value("0x1f", ValueWidth::U32), Ok(0x1F));
        assert_eq!(parse_value("0XFF", ValueWidth::U8), Ok(0xFF));
        assert_eq!(parse_value("017", ValueWidth::U32), Ok(0o17));
        assert_eq!(parse_value("4294967295", ValueWidth::U32), Ok(u32::MAX));
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in ["", "\n", "0x", "-1", "++1", " 1", "1 ", "1\n\n", "12a", "09", "abc"] {
            assert_eq!(
                parse_value(bad, ValueWidth::U32),
                Err(RegError::ParseFailed),
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn rejects_values_wider_than_the_attribute() {
        assert_eq!(parse_value("255", ValueWidth::U8), Ok(255));
        assert_eq!(parse_value("256", ValueWidth::U8), Err(RegError::ParseFailed));
        assert_eq!(parse_value("65536", ValueWidth::U16), Err(RegError::ParseFailed));
        assert_eq!(parse_value("4294967296", ValueWidth::U32), Err(RegError::ParseFailed));
    }

    #[test]
    fn scan_takes_the_leading_decimal_number() {
        assert_eq!(scan_decimal("4095\n"), Ok(4095));
        assert_eq!(scan_decimal("  +7 apples"), Ok(7));
        // Always base 10, no prefixes
        assert_eq!(scan_decimal("010\n"), Ok(10));
        assert_eq!(scan_decimal("0x10"), Ok(0));
        // Only the first number counts
        assert_eq!(scan_decimal("2\n3\n"), Ok(2));
        assert_eq!(scan_decimal("99999999999"), Ok(u32::MAX));

        for bad in ["", "\n", "+", "-1", "n/a", "x1"] {
            assert_eq!(scan_decimal(bad), Err(RegError::ParseFailed), "input {bad:?}");
        }
    }

    #[test]
    fn formats_decimal_with_newline() {
        assert_eq!(format_value(0).as_str(), "0\n");
        assert_eq!(format_value(4095).as_str(), "4095\n");
        assert_eq!(format_value(u32::MAX).as_str(), "4294967295\n");
    }
}
