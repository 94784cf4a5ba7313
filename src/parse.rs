//! Scalar parsers for pipe-delimited fields.
//!
//! The plain variants never fail: they stop at the first non-digit and
//! return whatever was accumulated so far (often 0). They are only correct
//! for trusted, pre-validated data. The `_strict` variants check the whole
//! field and return `None` instead.

/// Parses an optionally `-`-prefixed decimal integer, stopping at the first non-digit.
#[inline]
pub fn parse_int(field: &[u8]) -> i32 {
    let (neg, digits) = match field.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, field),
    };
    let mut v: i32 = 0;
    for &c in digits {
        let d = c.wrapping_sub(b'0');
        if d > 9 {
            break;
        }
        v = v.wrapping_mul(10).wrapping_add(d as i32);
    }
    if neg {
        v.wrapping_neg()
    } else {
        v
    }
}

/// Parses `[-]digits[.digits]`. Each fractional digit is weighted by the
/// next power of ten, so short literals like prices and discounts come out exact
/// to within f64 precision.
#[inline]
pub fn parse_decimal(field: &[u8]) -> f64 {
    let (sign, rest) = match field.split_first() {
        Some((b'-', rest)) => (-1.0, rest),
        _ => (1.0, field),
    };
    let mut i = 0;
    let n = rest.len();

    // Integer part
    let mut v = 0.0f64;
    while i < n {
        let d = rest[i].wrapping_sub(b'0');
        if d > 9 {
            break;
        }
        v = v * 10.0 + d as f64;
        i += 1;
    }

    // Fractional part
    if i < n && rest[i] == b'.' {
        i += 1;
        let mut place = 0.1;
        while i < n {
            let d = rest[i].wrapping_sub(b'0');
            if d > 9 {
                break;
            }
            v += d as f64 * place;
            place *= 0.1;
            i += 1;
        }
    }
    sign * v
}

/// Like [`parse_int`] but requires the whole field to be a non-empty
/// integer that fits in `i32`.
pub fn parse_int_strict(field: &[u8]) -> Option<i32> {
    let (neg, digits) = match field.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, field),
    };
    if digits.is_empty() {
        return None;
    }
    let mut v: i64 = 0;
    for &c in digits {
        if !c.is_ascii_digit() {
            return None;
        }
        v = v * 10 + (c - b'0') as i64;
        if v > i32::MAX as i64 + 1 {
            return None;
        }
    }
    let v = if neg { -v } else { v };
    i32::try_from(v).ok()
}

/// Like [`parse_decimal`] but requires at least one integer digit, an
/// optional `.` followed by at least one digit, and nothing else.
pub fn parse_decimal_strict(field: &[u8]) -> Option<f64> {
    let unsigned = field.strip_prefix(b"-").unwrap_or(field);
    let (int_part, frac_part) = match memchr::memchr(b'.', unsigned) {
        Some(dot) => (&unsigned[..dot], Some(&unsigned[dot + 1..])),
        None => (unsigned, None),
    };
    let digits_only = |s: &[u8]| !s.is_empty() && s.iter().all(u8::is_ascii_digit);
    if !digits_only(int_part) || !frac_part.map_or(true, digits_only) {
        return None;
    }
    Some(parse_decimal(field))
}
