/// Byte classes recognised by the framing grammar.
///
/// Classification is a single table lookup per byte. Only ASCII bytes are
/// ever members, so no locale or Unicode rules can leak into framing:
///
/// ```text
/// ┌────────────┬──────────────────────────────────────┐
/// │ Class      │ Members                              │
/// ├────────────┼──────────────────────────────────────┤
/// │ whitespace │ 0x20 SP, 0x09 HT, 0x0D CR, 0x0A LF,  │
/// │            │ 0x0C FF                              │
/// │ digit      │ 0x30..=0x39 ('0'..='9')              │
/// └────────────┴──────────────────────────────────────┘
/// ```
const fn table(members: &[u8]) -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < members.len() {
        table[members[i] as usize] = true;
        i += 1;
    }
    table
}

static WHITESPACE: [bool; 256] = table(b" \t\r\n\x0c");
static DIGITS: [bool; 256] = table(b"0123456789");

/// Returns `true` for the five whitespace bytes that may pad frames.
#[inline]
#[must_use]
pub fn is_whitespace(byte: u8) -> bool {
    WHITESPACE[usize::from(byte)]
}

/// Returns `true` for ASCII decimal digits.
#[inline]
#[must_use]
pub fn is_digit(byte: u8) -> bool {
    DIGITS[usize::from(byte)]
}

/// Length of the longest prefix of `buf` whose bytes all satisfy `class`.
#[inline]
pub fn run_length(buf: &[u8], class: fn(u8) -> bool) -> usize {
    buf.iter().position(|&b| !class(b)).unwrap_or(buf.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_exactly_five_bytes() {
        let members: Vec<u8> = (0..=255u8).filter(|&b| is_whitespace(b)).collect();
        assert_eq!(members, vec![0x09, 0x0A, 0x0C, 0x0D, 0x20]);
    }

    #[test]
    fn digits_are_ascii_only() {
        let members: Vec<u8> = (0..=255u8).filter(|&b| is_digit(b)).collect();
        assert_eq!(members, b"0123456789".to_vec());
        // Vertical tab, NBSP and fullwidth digit bytes are never skipped
        assert!(!is_whitespace(0x0B));
        assert!(!is_whitespace(0xA0));
        assert!(!is_digit(0xEF));
    }

    #[test]
    fn run_length_stops_at_first_non_member() {
        assert_eq!(run_length(b" \t\n37{", is_whitespace), 3);
        assert_eq!(run_length(b"37{", is_digit), 2);
        assert_eq!(run_length(b"  ", is_whitespace), 2);
        assert_eq!(run_length(b"", is_digit), 0);
    }
}
