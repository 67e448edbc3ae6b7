//! Segmented output buffer.
//!
//! An append-only sink made of fixed-capacity segments. Only the tail
//! segment is writable; when it fills, a fresh segment is appended and no
//! existing segment is ever resized or copied. The segments are concatenated
//! exactly once, in [`SegmentedBuffer::finalize`], at the very end of a
//! serialization task.
//!
//! The buffer is generic over its text unit: one-byte (Latin-1) units for
//! narrow output, two-byte (UTF-16) units for wide output. The traversal
//! engine is monomorphized per unit width instead of branching per
//! character.

/// Default segment capacity, in units.
pub(crate) const SEGMENT_UNITS: usize = 4096;

/// A fixed-width text unit the buffer and traversal engine specialize over.
pub(crate) trait TextUnit: Copy + 'static {
    /// Whether this is the two-byte instantiation.
    const WIDE: bool;

    /// Widens a one-byte (Latin-1) code point.
    fn from_byte(b: u8) -> Self;

    /// Appends an ASCII byte run, bulk-copying where the width allows.
    fn extend_ascii(out: &mut SegmentedBuffer<Self>, bytes: &[u8]);

    /// Appends one scalar value as one or two units.
    fn push_scalar(out: &mut SegmentedBuffer<Self>, c: char);

    /// Decodes all segments, in order, onto a string.
    fn finalize(segments: Vec<Vec<Self>>, out: &mut String);
}

impl TextUnit for u8 {
    const WIDE: bool = false;

    #[inline]
    fn from_byte(b: u8) -> Self {
        b
    }

    #[inline]
    fn extend_ascii(out: &mut SegmentedBuffer<Self>, bytes: &[u8]) {
        out.extend_from_slice(bytes);
    }

    #[inline]
    fn push_scalar(out: &mut SegmentedBuffer<Self>, c: char) {
        debug_assert!(u32::from(c) <= 0xFF);
        out.push(u32::from(c) as u8);
    }

    fn finalize(segments: Vec<Vec<Self>>, out: &mut String) {
        for segment in segments {
            if segment.is_ascii() {
                if let Ok(text) = std::str::from_utf8(&segment) {
                    out.push_str(text);
                    continue;
                }
            }
            out.extend(segment.iter().map(|&b| char::from(b)));
        }
    }
}

impl TextUnit for u16 {
    const WIDE: bool = true;

    #[inline]
    fn from_byte(b: u8) -> Self {
        u16::from(b)
    }

    fn extend_ascii(out: &mut SegmentedBuffer<Self>, bytes: &[u8]) {
        for &b in bytes {
            out.push(u16::from(b));
        }
    }

    #[inline]
    fn push_scalar(out: &mut SegmentedBuffer<Self>, c: char) {
        let mut units = [0u16; 2];
        for &unit in c.encode_utf16(&mut units).iter() {
            out.push(unit);
        }
    }

    fn finalize(segments: Vec<Vec<Self>>, out: &mut String) {
        // Surrogate pairs may straddle a segment boundary; decode the unit
        // stream as a whole, not per segment.
        let units = segments.iter().flat_map(|s| s.iter().copied());
        out.extend(
            char::decode_utf16(units).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
        );
    }
}

/// An ordered sequence of fixed-capacity segments with a writable tail.
#[derive(Debug)]
pub(crate) struct SegmentedBuffer<U> {
    segments: Vec<Vec<U>>,
}

impl<U: TextUnit> SegmentedBuffer<U> {
    pub(crate) fn new() -> Self {
        Self {
            segments: vec![Vec::with_capacity(SEGMENT_UNITS)],
        }
    }

    /// Appends a segment sized for at least `needed` units.
    fn grow(&mut self, needed: usize) {
        self.segments
            .push(Vec::with_capacity(needed.max(SEGMENT_UNITS)));
    }

    fn tail(&mut self) -> &mut Vec<U> {
        self.segments
            .last_mut()
            .expect("buffer always has a tail segment")
    }

    /// Appends one unit.
    pub(crate) fn push(&mut self, unit: U) {
        let tail = self.tail();
        if tail.len() == tail.capacity() {
            self.grow(SEGMENT_UNITS);
        }
        self.tail().push(unit);
    }

    /// Appends a unit slice, splitting across segment boundaries as needed.
    pub(crate) fn extend_from_slice(&mut self, mut units: &[U]) {
        while !units.is_empty() {
            let tail = self.tail();
            let room = tail.capacity() - tail.len();
            if room == 0 {
                self.grow(units.len());
                continue;
            }
            let take = room.min(units.len());
            tail.extend_from_slice(&units[..take]);
            units = &units[take..];
        }
    }

    /// Appends an ASCII byte run.
    pub(crate) fn push_ascii(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.is_ascii());
        U::extend_ascii(self, bytes);
    }

    /// Appends a single ASCII punctuation byte.
    pub(crate) fn push_byte(&mut self, b: u8) {
        self.push(U::from_byte(b));
    }

    /// Total units written.
    pub(crate) fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// Decodes the logical content onto `out`. Consumes the buffer; called
    /// once, at the very end of serialization.
    pub(crate) fn finalize_into(self, out: &mut String) {
        U::finalize(self.segments, out);
    }

    /// Decodes the logical content into a fresh string.
    pub(crate) fn finalize(self) -> String {
        let mut out = String::new();
        self.finalize_into(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_across_segments_without_copying() {
        let mut buf = SegmentedBuffer::<u8>::new();
        let chunk = vec![b'x'; SEGMENT_UNITS - 3];
        buf.extend_from_slice(&chunk);
        buf.extend_from_slice(b"abcdef");
        assert_eq!(buf.segments.len(), 2);
        assert_eq!(buf.segments[0].len(), SEGMENT_UNITS);
        assert_eq!(buf.segments[1].len(), 3);
        let text = buf.finalize();
        assert_eq!(text.len(), SEGMENT_UNITS + 3);
        assert!(text.ends_with("abcdef"));
    }

    #[test]
    fn oversized_write_gets_a_fitted_segment() {
        let mut buf = SegmentedBuffer::<u8>::new();
        buf.extend_from_slice(&vec![b'y'; SEGMENT_UNITS]);
        let big = vec![b'z'; 3 * SEGMENT_UNITS];
        buf.extend_from_slice(&big);
        // The second segment was sized to fit the whole remaining write.
        assert_eq!(buf.segments.len(), 2);
        assert_eq!(buf.segments[1].len(), 3 * SEGMENT_UNITS);
    }

    #[test]
    fn latin1_bytes_decode() {
        let mut buf = SegmentedBuffer::<u8>::new();
        buf.push(0xE9); // é
        buf.push_ascii(b"!");
        assert_eq!(buf.finalize(), "\u{e9}!");
    }

    #[test]
    fn surrogate_pair_across_boundary() {
        let mut buf = SegmentedBuffer::<u16>::new();
        // Fill to one unit below the boundary, then write an astral pair.
        for _ in 0..SEGMENT_UNITS - 1 {
            buf.push(u16::from(b'a'));
        }
        u16::push_scalar(&mut buf, '\u{1f600}');
        assert_eq!(buf.segments.len(), 2);
        let text = buf.finalize();
        assert!(text.ends_with('\u{1f600}'));
    }
}
