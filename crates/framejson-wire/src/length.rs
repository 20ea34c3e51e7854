use crate::charclass::is_digit;
use crate::error::WireError;

/// Most significant digits accepted in a length prefix.
///
/// `u64::MAX` has 20 decimal digits. Leading zeros do not count, so a
/// zero-padded prefix of any width is accepted. Longer runs of significant
/// digits are rejected while they are still being collected, so a hostile
/// stream of digits cannot grow the prefix buffer without bound.
pub const MAX_LENGTH_DIGITS: usize = 20;

/// Parse a collected digit run into a payload length.
///
/// `offset` is the stream position of the first digit and is only used
/// for error reporting.
///
/// # Errors
///
/// [`WireError::InvalidLength`] if `digits` is empty, has more than
/// [`MAX_LENGTH_DIGITS`] significant digits, contains a non-digit byte, or
/// overflows `usize`.
///
/// | Input          | Result              |
/// |----------------|---------------------|
/// | `b"0"`         | `Ok(0)`             |
/// | `b"037"`       | `Ok(37)`            |
/// | `b""`          | `Err(InvalidLength)`|
/// | `b"3a"`        | `Err(InvalidLength)`|
pub fn parse_length(digits: &[u8], offset: u64) -> Result<usize, WireError> {
    let invalid = || WireError::InvalidLength {
        digits: String::from_utf8_lossy(digits).into_owned(),
        offset,
    };

    if digits.is_empty() || significant_digits(digits).len() > MAX_LENGTH_DIGITS {
        return Err(invalid());
    }

    let mut value: u64 = 0;
    for &byte in digits {
        if !is_digit(byte) {
            return Err(invalid());
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or_else(invalid)?;
    }

    usize::try_from(value).map_err(|_| invalid())
}

/// `digits` without its leading zeros. Empty for an all-zero run.
#[must_use]
pub fn significant_digits(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&b| b == b'0').count();
    &digits[zeros..]
}

/// Append one digit run to a length prefix collected across chunks.
///
/// Leading zeros are dropped as they arrive: `acc` holds either a single
/// `0` or only significant digits, so its length is what gets checked
/// against [`MAX_LENGTH_DIGITS`].
pub fn extend_digits(acc: &mut Vec<u8>, run: &[u8]) {
    if !acc.is_empty() && acc.as_slice() != b"0" {
        acc.extend_from_slice(run);
        return;
    }
    let significant = significant_digits(run);
    if !significant.is_empty() {
        acc.clear();
        acc.extend_from_slice(significant);
    } else if !run.is_empty() {
        acc.clear();
        acc.push(b'0');
    }
}
