//! Field-level codec for the four wire representations
//!
//! Reads never fail on malformed data: they record a diagnostic through the
//! sink and return a sentinel (`-1`, `None`), so one corrupt field does not
//! abort a record scan. Writes are the opposite: a value that does not fit
//! its field is a programming-contract error.

use crate::diagnostics::{Diagnostic, Diagnostics, FieldCategory};
use crate::encoding::{is_dtaus_alpha, is_dtaus_char, Encoding};
use crate::error::{DtausError, Result};
use chrono::{Datelike, NaiveDate};

/// Sign nibble marking a positive packed value.
const PACKED_POSITIVE: u8 = 0xC;

/// Years representable by the two-digit short date.
pub const MIN_YEAR: i32 = 1980;
pub const MAX_YEAR: i32 = 2079;

fn illegal(field: u32, category: FieldCategory, position: u64, raw: &[u8]) -> Diagnostic {
    Diagnostic::IllegalData {
        field,
        category,
        position,
        raw: raw.to_vec(),
    }
}

/// Reads a fixed-width plain-digit field.
///
/// Returns `-1` and records an illegal-data diagnostic if any byte is not a
/// digit of the profile. With `spaces_as_zero` set, space bytes are treated
/// as the zero digit first (legacy files pad numeric fields with blanks);
/// the substitution is logged, never applied silently.
pub fn read_number(
    field: u32,
    enc: &Encoding,
    buf: &[u8],
    position: u64,
    sink: &mut Diagnostics,
    spaces_as_zero: bool,
) -> i64 {
    let mut value: i64 = 0;
    let mut substituted = false;
    for &byte in buf {
        let byte = if spaces_as_zero && byte == enc.space {
            substituted = true;
            enc.digit(0)
        } else {
            byte
        };
        match enc.digit_value(byte) {
            Some(d) => value = value * 10 + i64::from(d),
            None => {
                sink.record(illegal(field, FieldCategory::Numeric, position, buf));
                return -1;
            }
        }
    }
    if substituted {
        tracing::info!(field, position, "read blank bytes in numeric field as zero");
    }
    value
}

/// Writes `value` right-justified with leading zero digits.
pub fn write_number(field: u32, enc: &Encoding, buf: &mut [u8], value: u64) -> Result<()> {
    if let Some(bound) = 10u64.checked_pow(buf.len() as u32) {
        if value >= bound {
            return Err(DtausError::InvalidArgument(format!(
                "value {value} exceeds {} digits of field {field:X}",
                buf.len()
            )));
        }
    }
    let mut rest = value;
    for byte in buf.iter_mut().rev() {
        *byte = enc.digit((rest % 10) as u8);
        rest /= 10;
    }
    Ok(())
}

/// Reads a packed-decimal field, two digits per byte.
///
/// With `signed` set the lowest nibble is the sign and must be `0xC`
/// (positive); DTAUS carries no negative amounts. Returns `-1` on any
/// nibble outside its valid range.
pub fn read_packed(
    field: u32,
    buf: &[u8],
    position: u64,
    sink: &mut Diagnostics,
    signed: bool,
) -> i64 {
    let mut value: i64 = 0;
    let nibble_count = buf.len() * 2;
    for i in 0..nibble_count {
        let byte = buf[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        let is_sign = signed && i == nibble_count - 1;
        if is_sign {
            if nibble != PACKED_POSITIVE {
                sink.record(illegal(field, FieldCategory::PackedPositive, position, buf));
                return -1;
            }
        } else if nibble <= 9 {
            value = value * 10 + i64::from(nibble);
        } else {
            sink.record(illegal(field, FieldCategory::PackedPositive, position, buf));
            return -1;
        }
    }
    value
}

/// Writes a packed-decimal field; the sign nibble is always positive.
pub fn write_packed(field: u32, buf: &mut [u8], value: u64, signed: bool) -> Result<()> {
    let digits = buf.len() * 2 - usize::from(signed);
    if let Some(bound) = 10u64.checked_pow(digits as u32) {
        if value >= bound {
            return Err(DtausError::InvalidArgument(format!(
                "value {value} exceeds {digits} packed digits of field {field:X}"
            )));
        }
    }
    let mut nibbles = vec![0u8; buf.len() * 2];
    if signed {
        nibbles[buf.len() * 2 - 1] = PACKED_POSITIVE;
    }
    let mut rest = value;
    let mut i = buf.len() * 2 - 1 - usize::from(signed);
    loop {
        nibbles[i] = (rest % 10) as u8;
        rest /= 10;
        if i == 0 || rest == 0 {
            break;
        }
        i -= 1;
    }
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = (nibbles[2 * i] << 4) | nibbles[2 * i + 1];
    }
    Ok(())
}

/// Reads a big-endian unsigned integer of 1-8 bytes.
pub fn read_binary(buf: &[u8]) -> Result<u64> {
    if buf.is_empty() || buf.len() > 8 {
        return Err(DtausError::InvalidArgument(format!(
            "binary field length {} outside 1-8",
            buf.len()
        )));
    }
    let mut value: u64 = 0;
    for &byte in buf {
        value = (value << 8) | u64::from(byte);
    }
    Ok(value)
}

/// Writes a big-endian unsigned integer of 1-8 bytes.
pub fn write_binary(buf: &mut [u8], value: u64) -> Result<()> {
    if buf.is_empty() || buf.len() > 8 {
        return Err(DtausError::InvalidArgument(format!(
            "binary field length {} outside 1-8",
            buf.len()
        )));
    }
    if buf.len() < 8 && value >> (buf.len() * 8) != 0 {
        return Err(DtausError::InvalidArgument(format!(
            "value {value} exceeds {} binary bytes",
            buf.len()
        )));
    }
    for (i, byte) in buf.iter_mut().rev().enumerate() {
        *byte = (value >> (8 * i)) as u8;
    }
    Ok(())
}

/// Reads fixed-width text, validating against the category charset.
///
/// Trailing padding is trimmed. A byte outside the profile or a character
/// outside the category charset yields a diagnostic and `None`.
pub fn read_string(
    field: u32,
    enc: &Encoding,
    buf: &[u8],
    position: u64,
    category: FieldCategory,
    sink: &mut Diagnostics,
) -> Option<String> {
    let mut text = String::with_capacity(buf.len());
    for &byte in buf {
        match enc.decode_char(byte) {
            Some(c) => {
                let valid = match category {
                    FieldCategory::Alphabetic => is_dtaus_alpha(c) || c == ' ',
                    _ => is_dtaus_char(c),
                };
                if !valid {
                    sink.record(illegal(field, category, position, buf));
                    return None;
                }
                text.push(c);
            }
            None => {
                sink.record(illegal(field, category, position, buf));
                return None;
            }
        }
    }
    while text.ends_with(' ') {
        text.pop();
    }
    Some(text)
}

/// Writes text left-justified, padded with the profile's space byte.
pub fn write_string(field: u32, enc: &Encoding, buf: &mut [u8], text: &str) -> Result<()> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() > buf.len() {
        return Err(DtausError::InvalidArgument(format!(
            "text of {} characters exceeds field {field:X} width {}",
            chars.len(),
            buf.len()
        )));
    }
    for (i, slot) in buf.iter_mut().enumerate() {
        *slot = match chars.get(i) {
            Some(&c) => enc.encode_char(c).ok_or_else(|| {
                DtausError::InvalidArgument(format!(
                    "character {c:?} not in the DTAUS charset (field {field:X})"
                ))
            })?,
            None => enc.space,
        };
    }
    Ok(())
}

/// Reads a 6-digit DDMMYY date; all-blank is absent.
///
/// The two-digit year pivots at 79: `YY <= 79` maps to `2000 + YY`, higher
/// values to `1900 + YY`.
pub fn read_short_date(
    field: u32,
    enc: &Encoding,
    buf: &[u8],
    position: u64,
    sink: &mut Diagnostics,
) -> Option<NaiveDate> {
    debug_assert_eq!(buf.len(), 6);
    if buf.iter().all(|&b| b == enc.space) {
        return None;
    }
    let mut digits = [0u32; 6];
    for (i, &byte) in buf.iter().enumerate() {
        match enc.digit_value(byte) {
            Some(d) => digits[i] = u32::from(d),
            None => {
                sink.record(illegal(field, FieldCategory::Numeric, position, buf));
                return None;
            }
        }
    }
    let day = digits[0] * 10 + digits[1];
    let month = digits[2] * 10 + digits[3];
    let yy = digits[4] * 10 + digits[5];
    let year = if yy <= 79 { 2000 + yy } else { 1900 + yy } as i32;
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => Some(date),
        None => {
            sink.record(illegal(field, FieldCategory::Numeric, position, buf));
            None
        }
    }
}

/// Writes a 6-digit DDMMYY date; `None` writes an all-blank field.
pub fn write_short_date(
    field: u32,
    enc: &Encoding,
    buf: &mut [u8],
    date: Option<NaiveDate>,
) -> Result<()> {
    debug_assert_eq!(buf.len(), 6);
    let Some(date) = date else {
        buf.fill(enc.space);
        return Ok(());
    };
    check_year(field, date)?;
    let packed = u64::from(date.day()) * 10_000
        + u64::from(date.month()) * 100
        + (date.year() % 100) as u64;
    write_number(field, enc, buf, packed)
}

/// Reads an 8-digit DDMMYYYY date; all-blank is absent.
pub fn read_long_date(
    field: u32,
    enc: &Encoding,
    buf: &[u8],
    position: u64,
    sink: &mut Diagnostics,
) -> Option<NaiveDate> {
    debug_assert_eq!(buf.len(), 8);
    if buf.iter().all(|&b| b == enc.space) {
        return None;
    }
    let mut digits = [0u32; 8];
    for (i, &byte) in buf.iter().enumerate() {
        match enc.digit_value(byte) {
            Some(d) => digits[i] = u32::from(d),
            None => {
                sink.record(illegal(field, FieldCategory::Numeric, position, buf));
                return None;
            }
        }
    }
    let day = digits[0] * 10 + digits[1];
    let month = digits[2] * 10 + digits[3];
    let year = (digits[4] * 1000 + digits[5] * 100 + digits[6] * 10 + digits[7]) as i32;
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => Some(date),
        None => {
            sink.record(illegal(field, FieldCategory::Numeric, position, buf));
            None
        }
    }
}

/// Writes an 8-digit DDMMYYYY date; `None` writes an all-blank field.
///
/// The layout is derived from the field width alone: two day digits, two
/// month digits, four year digits, no shared state with the short-date
/// path.
pub fn write_long_date(
    field: u32,
    enc: &Encoding,
    buf: &mut [u8],
    date: Option<NaiveDate>,
) -> Result<()> {
    debug_assert_eq!(buf.len(), 8);
    let Some(date) = date else {
        buf.fill(enc.space);
        return Ok(());
    };
    check_year(field, date)?;
    let packed = u64::from(date.day()) * 1_000_000
        + u64::from(date.month()) * 10_000
        + date.year() as u64;
    write_number(field, enc, buf, packed)
}

fn check_year(field: u32, date: NaiveDate) -> Result<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return Err(DtausError::InvalidArgument(format!(
            "year {} of field {field:X} outside {MIN_YEAR}-{MAX_YEAR}",
            date.year()
        )));
    }
    Ok(())
}
