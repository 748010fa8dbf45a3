use crate::constants::FIELD_DELIMITER;
use crate::error::ParseFailure;
use memchr::memchr;

/// Splits a line (without terminator) at the first `;` and parses the value into tenths.
#[inline]
pub fn parse_record(line: &[u8]) -> Result<(&[u8], i64), ParseFailure> {
    let delim = memchr(FIELD_DELIMITER, line).ok_or(ParseFailure::MissingDelimiter)?;
    let value = parse_tenths(&line[delim + 1..])?;
    Ok((&line[..delim], value))
}

/// Parses `-?[0-9]+\.[0-9]` into a fixed-point integer of tenths (`-12.3` -> `-123`).
#[inline]
pub fn parse_tenths(bytes: &[u8]) -> Result<i64, ParseFailure> {
    if bytes.is_empty() { return Err(ParseFailure::EmptyValue); }
    let (negative, digits) = match bytes[0] {
        b'-' => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    let n = digits.len();
    // at least one integer digit, the dot and exactly one fractional digit
    if n < 3 || digits[n - 2] != b'.' { return Err(ParseFailure::InvalidNumber); }
    let mut acc: i64 = 0;
    for &b in digits[..n - 2].iter().chain(std::iter::once(&digits[n - 1])) {
        if !b.is_ascii_digit() { return Err(ParseFailure::InvalidNumber); }
        acc = acc
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as i64))
            .ok_or(ParseFailure::InvalidNumber)?;
    }
    Ok(if negative { -acc } else { acc })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_one_decimal_values() {
        assert_eq!(parse_tenths(b"0.0"), Ok(0));
        assert_eq!(parse_tenths(b"5.0"), Ok(50));
        assert_eq!(parse_tenths(b"-12.3"), Ok(-123));
        assert_eq!(parse_tenths(b"99.9"), Ok(999));
        assert_eq!(parse_tenths(b"-0.1"), Ok(-1));
        assert_eq!(parse_tenths(b"1234.5"), Ok(12345));
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(parse_tenths(b""), Err(ParseFailure::EmptyValue));
        let bad_values: &[&[u8]] = &[b"5", b"5.", b".5", b"-.5", b"5.25", b"abc", b"1x.0", b"--1.0", b" 1.0", b"1.0\r", b"+1.0"];
        for &bad in bad_values {
            assert_eq!(parse_tenths(bad), Err(ParseFailure::InvalidNumber), "{:?}", String::from_utf8_lossy(bad));
        }
        assert_eq!(parse_tenths(b"99999999999999999999.9"), Err(ParseFailure::InvalidNumber));
    }

    #[test]
    fn splits_at_first_delimiter_without_trimming() {
        assert_eq!(parse_record(b"Hamburg;12.0"), Ok((&b"Hamburg"[..], 120)));
        assert_eq!(parse_record(b" St. John's ;-3.4"), Ok((&b" St. John's "[..], -34)));
        assert_eq!(parse_record(b";1.0"), Ok((&b""[..], 10)));
        assert_eq!(parse_record(b"a;b;1.0"), Err(ParseFailure::InvalidNumber));
        assert_eq!(parse_record(b"no delimiter"), Err(ParseFailure::MissingDelimiter));
        assert_eq!(parse_record(b"key;"), Err(ParseFailure::EmptyValue));
    }

    #[test]
    fn keys_are_raw_bytes() {
        let line = "Zürich;-0.5".as_bytes();
        let (key, value) = parse_record(line).unwrap();
        assert_eq!(key, "Zürich".as_bytes());
        assert_eq!(value, -5);
    }
}
