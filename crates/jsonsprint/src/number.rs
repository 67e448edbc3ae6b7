//! Shortest round-trip numeric formatting.
//!
//! Produces the decimal text ECMAScript `Number::toString(10)` would: the
//! shortest digit string that parses back to the exact same value, rendered
//! in plain decimal when the decimal exponent lies in `(-7, 21]` and in
//! exponent form outside that window. Digit generation is delegated to
//! [`ryu`] (any correct shortest-round-trip generator satisfies the
//! contract); integers in `i64` range take an [`itoa`] fast path.
//!
//! This module has no dependency on the rest of the serializer.

/// Maximum rendered length: sign + 21 integer digits, or sign + `0.` + six
/// leading zeros + 17 significant digits, or exponent form. 40 covers all.
const MAX_LEN: usize = 40;

/// Largest double below 2^53; integers up to here are exact in `i64`.
const EXACT_INT_BOUND: f64 = 9_007_199_254_740_992.0;

/// A reusable buffer for formatting `f64` values, in the style of
/// [`itoa::Buffer`] and [`ryu::Buffer`].
///
/// # Examples
///
/// ```
/// use jsonsprint::NumberBuffer;
///
/// let mut buf = NumberBuffer::new();
/// assert_eq!(buf.format(0.1), "0.1");
/// assert_eq!(buf.format(1e21), "1e+21");
/// assert_eq!(buf.format(-0.0), "0");
/// ```
#[derive(Debug)]
pub struct NumberBuffer {
    bytes: [u8; MAX_LEN],
}

impl Default for NumberBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl NumberBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: [0; MAX_LEN],
        }
    }

    /// Formats a finite `f64` as its shortest round-trip decimal text.
    ///
    /// The result is unspecified for non-finite inputs; callers map those to
    /// `null` before formatting.
    pub fn format(&mut self, value: f64) -> &str {
        debug_assert!(value.is_finite());
        if value == 0.0 {
            // Covers negative zero as well.
            return "0";
        }
        if value.fract() == 0.0 && value.abs() < EXACT_INT_BOUND {
            let mut itoa_buf = itoa::Buffer::new();
            let text = itoa_buf.format(value as i64);
            let len = text.len();
            self.bytes[..len].copy_from_slice(text.as_bytes());
            return rendered(&self.bytes[..len]);
        }
        let mut ryu_buf = ryu::Buffer::new();
        let decimal = ShortestDecimal::parse(ryu_buf.format_finite(value));
        let len = decimal.render(&mut self.bytes);
        rendered(&self.bytes[..len])
    }
}

fn rendered(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).expect("formatter emits ASCII")
}

/// A shortest decimal representation: `0.digits * 10^point`, per the
/// ECMAScript number-to-string notation (`s * 10^(n-k)` with `k` digits).
struct ShortestDecimal {
    negative: bool,
    digits: [u8; 17],
    ndigits: usize,
    point: i32,
}

impl ShortestDecimal {
    /// Parses ryu output (`-?D+(\.D+)?([eE][+-]?D+)?`) into digits plus a
    /// decimal-point position.
    fn parse(text: &str) -> Self {
        let (negative, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (mantissa, exponent) = match rest.split_once(['e', 'E']) {
            Some((m, e)) => (m, parse_exponent(e)),
            None => (rest, 0),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };

        let mut digits = [0u8; 17];
        let mut ndigits = 0;
        let mut leading_zeros = 0i32;
        let mut in_leading = true;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            if in_leading && b == b'0' {
                leading_zeros += 1;
                continue;
            }
            in_leading = false;
            if ndigits < digits.len() {
                digits[ndigits] = b;
                ndigits += 1;
            }
        }
        while ndigits > 0 && digits[ndigits - 1] == b'0' {
            ndigits -= 1;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let int_len = int_part.len() as i32;
        Self {
            negative,
            digits,
            ndigits,
            point: int_len - leading_zeros + exponent,
        }
    }

    /// Renders per the ECMAScript `Number::toString` grammar and returns the
    /// rendered length.
    fn render(&self, out: &mut [u8; MAX_LEN]) -> usize {
        let digits = &self.digits[..self.ndigits];
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let k = self.ndigits as i32;
        let n = self.point;
        let mut w = 0;
        let mut push = |out: &mut [u8; MAX_LEN], bytes: &[u8]| {
            out[w..w + bytes.len()].copy_from_slice(bytes);
            w += bytes.len();
        };

        if self.negative {
            push(out, b"-");
        }
        if k <= n && n <= 21 {
            // Integer: digits followed by n-k zeros.
            push(out, digits);
            for _ in 0..(n - k) {
                push(out, b"0");
            }
        } else if 0 < n && n <= 21 {
            // Point inside the digit string.
            let split = usize::try_from(n).unwrap_or(0);
            push(out, &digits[..split]);
            push(out, b".");
            push(out, &digits[split..]);
        } else if -6 < n && n <= 0 {
            // Leading 0.000... form.
            push(out, b"0.");
            for _ in 0..(-n) {
                push(out, b"0");
            }
            push(out, digits);
        } else {
            // Exponent form: d[.ddd]e±X with exponent n-1.
            push(out, &digits[..1]);
            if digits.len() > 1 {
                push(out, b".");
                push(out, &digits[1..]);
            }
            push(out, if n - 1 < 0 { b"e-" } else { b"e+" });
            let mut itoa_buf = itoa::Buffer::new();
            let exp = itoa_buf.format((n - 1).unsigned_abs());
            push(out, exp.as_bytes());
        }
        w
    }
}

fn parse_exponent(text: &str) -> i32 {
    text.parse().expect("ryu exponent is a small integer")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: f64) -> String {
        NumberBuffer::new().format(value).to_string()
    }

    #[test]
    fn integers() {
        assert_eq!(fmt(0.0), "0");
        assert_eq!(fmt(-0.0), "0");
        assert_eq!(fmt(1.0), "1");
        assert_eq!(fmt(-42.0), "-42");
        assert_eq!(fmt(1e15), "1000000000000000");
        assert_eq!(fmt(9_007_199_254_740_991.0), "9007199254740991");
    }

    #[test]
    fn large_integers_above_exact_range() {
        assert_eq!(fmt(9_007_199_254_740_992.0), "9007199254740992");
        assert_eq!(fmt(1e20), "100000000000000000000");
        assert_eq!(fmt(123_456_789_012_345_680_000.0), "123456789012345680000");
    }

    #[test]
    fn exponent_boundaries() {
        assert_eq!(fmt(1e21), "1e+21");
        assert_eq!(fmt(1e-6), "0.000001");
        assert_eq!(fmt(1e-7), "1e-7");
        assert_eq!(fmt(1.5e-300), "1.5e-300");
        assert_eq!(fmt(5e-324), "5e-324");
        assert_eq!(fmt(1e300), "1e+300");
    }

    #[test]
    fn shortest_fractions() {
        assert_eq!(fmt(0.1), "0.1");
        assert_eq!(fmt(123.456), "123.456");
        assert_eq!(fmt(-0.25), "-0.25");
        assert_eq!(fmt(0.3), "0.3");
    }

    #[test]
    fn round_trips() {
        for &v in &[
            0.1,
            -0.1,
            1.0 / 3.0,
            f64::MAX,
            f64::MIN_POSITIVE,
            5e-324,
            6.02214076e23,
            std::f64::consts::PI,
        ] {
            let text = fmt(v);
            let back: f64 = text.parse().expect("parses");
            assert_eq!(back.to_bits(), v.to_bits(), "{text}");
        }
    }
}
