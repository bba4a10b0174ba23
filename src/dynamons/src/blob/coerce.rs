//! Text-to-leaf coercion for edited blob values.

use super::BlobValue;

/// Reinterpret edited display text as a typed leaf.
///
/// Rules apply in order: ASCII digits only becomes an integer, a single `.`
/// with digits around it becomes a float, `true`/`false` in any case becomes
/// a boolean, and everything else stays a string. Signs and exponents are not
/// recognised, so `-1` and `1e3` remain strings.
pub fn coerce_leaf(text: &str) -> BlobValue {
    if is_digits(text) {
        if let Ok(i) = text.parse::<i64>() {
            return BlobValue::Integer(i);
        }
    }

    if is_decimal(text) {
        if let Ok(f) = text.parse::<f64>() {
            if f.is_finite() {
                return BlobValue::Float(f);
            }
        }
    }

    if text.eq_ignore_ascii_case("true") {
        return BlobValue::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return BlobValue::Bool(false);
    }

    BlobValue::Text(text.to_string())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(s: &str) -> bool {
    match s.split_once('.') {
        Some((whole, frac)) => {
            (is_digits(whole) || whole.is_empty())
                && (is_digits(frac) || frac.is_empty())
                && !(whole.is_empty() && frac.is_empty())
        }
        None => false,
    }
}
