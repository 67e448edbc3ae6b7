//! Character-escape scanning via chunked word-parallel comparison.
//!
//! A single pass over a string's bytes answers two questions at once: does
//! any unit require JSON escaping (`"`, `\`, or a control character below
//! U+0020), and can the string live in a one-byte (Latin-1) buffer or does
//! it need two-byte units. The pass processes 32-byte blocks as four 64-bit
//! words with branch-free byte-class masks, then finishes byte-wise; only
//! strings that contain an offending unit ever get a precise per-character
//! escaping pass, and only around the offending positions.
//!
//! Rope strings never reach this module: the traversal engine checks
//! flatness first, because inspecting a rope would allocate.

const LO: u64 = 0x0101_0101_0101_0101;
const HI: u64 = 0x8080_8080_8080_8080;

/// Encoding width a string needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Width {
    /// Every code point fits one byte (<= U+00FF).
    OneByte,
    /// At least one code point needs a two-byte unit.
    TwoByte,
}

/// Outcome of scanning a flat string.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ScanReport {
    /// Some unit requires a JSON escape sequence.
    pub needs_escaping: bool,
    /// The narrowest encoding the string fits in.
    pub width: Width,
    /// Every byte is ASCII; the raw bytes may be copied verbatim.
    pub ascii: bool,
}

/// Any byte in `w` equal to `b`?
#[inline]
fn any_eq(w: u64, b: u8) -> bool {
    let x = w ^ (LO.wrapping_mul(u64::from(b)));
    x.wrapping_sub(LO) & !x & HI != 0
}

/// Any byte in `w` below 0x20? Bytes with the high bit set are never
/// flagged, which is correct: they are not control characters.
#[inline]
fn any_below_space(w: u64) -> bool {
    w.wrapping_sub(LO.wrapping_mul(0x20)) & !w & HI != 0
}

#[inline]
fn word_needs_escape(w: u64) -> bool {
    any_below_space(w) || any_eq(w, b'"') || any_eq(w, b'\\')
}

#[inline]
pub(crate) fn byte_needs_escape(b: u8) -> bool {
    b < 0x20 || b == b'"' || b == b'\\'
}

/// Scans a flat string in one pass.
pub(crate) fn scan(s: &str) -> ScanReport {
    let bytes = s.as_bytes();
    let mut needs_escaping = false;
    let mut high = 0u64;

    let mut tail = bytes;
    // 32-byte blocks, four words per iteration.
    while let Some((block, rest)) = tail.split_first_chunk::<32>() {
        let mut inner: &[u8] = block;
        while let Some((chunk, inner_rest)) = inner.split_first_chunk::<8>() {
            let w = u64::from_le_bytes(*chunk);
            needs_escaping |= word_needs_escape(w);
            high |= w & HI;
            inner = inner_rest;
        }
        tail = rest;
    }
    // Word-sized remainder.
    while let Some((chunk, rest)) = tail.split_first_chunk::<8>() {
        let w = u64::from_le_bytes(*chunk);
        needs_escaping |= word_needs_escape(w);
        high |= w & HI;
        tail = rest;
    }
    for &b in tail {
        needs_escaping |= byte_needs_escape(b);
        high |= u64::from(b) & 0x80;
    }

    let ascii = high == 0;
    let width = if ascii || s.chars().all(|c| u32::from(c) <= 0xFF) {
        Width::OneByte
    } else {
        Width::TwoByte
    };
    ScanReport {
        needs_escaping,
        width,
        ascii,
    }
}

/// Length of the leading run of bytes that can be copied verbatim: ASCII and
/// needing no escape. Used by the escaping pass to bulk-copy clean stretches
/// and inspect only the offenders.
pub(crate) fn clean_ascii_run(bytes: &[u8]) -> usize {
    let mut i = 0;
    let mut tail = bytes;
    while let Some((chunk, rest)) = tail.split_first_chunk::<8>() {
        let w = u64::from_le_bytes(*chunk);
        if word_needs_escape(w) || w & HI != 0 {
            break;
        }
        i += 8;
        tail = rest;
    }
    while i < bytes.len() {
        let b = bytes[i];
        if byte_needs_escape(b) || b >= 0x80 {
            break;
        }
        i += 1;
    }
    i
}

const HEX: &[u8; 16] = b"0123456789abcdef";

/// The two-character escape for a unit, if one exists.
pub(crate) fn short_escape(b: u8) -> Option<&'static str> {
    match b {
        0x08 => Some("\\b"),
        0x09 => Some("\\t"),
        0x0A => Some("\\n"),
        0x0C => Some("\\f"),
        0x0D => Some("\\r"),
        b'"' => Some("\\\""),
        b'\\' => Some("\\\\"),
        _ => None,
    }
}

/// The six-character `\u00xx` escape for a control character.
pub(crate) fn unicode_escape(b: u8) -> [u8; 6] {
    debug_assert!(b < 0x20);
    [
        b'\\',
        b'u',
        b'0',
        b'0',
        HEX[usize::from(b >> 4)],
        HEX[usize::from(b & 0xF)],
    ]
}
