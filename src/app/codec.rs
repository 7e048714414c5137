//! Payload decoding and canonical re-encoding.
//!
//! Centrals on different platforms encode the same logical value in
//! different ways (a raw `0x01` byte from one, the ASCII digit `'1'` from
//! another), so decoding is permissive and never fails.

use super::attributes::{AttributeValue, ValueKind};

/// Falsy sentinel written back to the scan-command attribute.
pub const FLAG_RESET: [u8; 1] = [0x00];

/// Decode `raw` according to `kind`.  Never fails.
pub fn decode(kind: ValueKind, raw: &[u8]) -> AttributeValue {
    match kind {
        ValueKind::Text => AttributeValue::Text(decode_text(raw)),
        ValueKind::Integer => AttributeValue::Integer(decode_integer(raw)),
        ValueKind::Flag => AttributeValue::Flag(decode_flag(raw)),
    }
}

/// UTF-8 passthrough; invalid sequences are replaced, not rejected.
pub fn decode_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Leading-digits integer parse.
///
/// Skips leading ASCII whitespace, accepts one optional sign, then consumes
/// digits until the first non-digit.  No digits → `0`.  Out-of-range values
/// clamp to the `i32` bounds.
pub fn decode_integer(raw: &[u8]) -> i32 {
    let mut bytes = raw
        .iter()
        .copied()
        .skip_while(u8::is_ascii_whitespace)
        .peekable();

    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    let mut acc: i64 = 0;
    for b in bytes.take_while(u8::is_ascii_digit) {
        acc = (acc * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    let signed = if negative { -acc } else { acc };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// `true` iff the first byte is `0x01`, `'1'`, `'t'` or `'T'`.
pub fn decode_flag(raw: &[u8]) -> bool {
    matches!(raw.first(), Some(0x01 | b'1' | b't' | b'T'))
}

/// Canonical reflected encoding of a decoded value.
pub fn encode(value: &AttributeValue) -> Vec<u8> {
    match value {
        AttributeValue::Text(s) => s.as_bytes().to_vec(),
        AttributeValue::Integer(v) => v.to_string().into_bytes(),
        AttributeValue::Flag(v) => encode_flag(*v).to_vec(),
    }
}

/// ASCII `"1"` / `"0"`, the form the settings attributes are seeded with.
pub fn encode_flag(value: bool) -> &'static [u8] {
    if value { b"1" } else { b"0" }
}

/// Join discovered network names for the network-list attribute.
pub fn join_networks(names: &[String]) -> String {
    names.join(", ")
}
