//! Boundary coercion for untyped snapshot fields.

use serde_json::Value;

/// Coerce a boolean-like field.
///
/// Input domain:
/// - `true` or the number `1` => `Some(true)`
/// - `false` or the number `0` => `Some(false)`
/// - anything else (`null`, strings, other numbers, arrays, objects) => `None`
///
/// `None` means the signal is absent, which is distinct from "off".
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => Some(true),
            Some(v) if v == 0.0 => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce a numeric field.
///
/// Accepts JSON numbers and strings starting with a decimal number; trailing
/// text is ignored, so `"90deg"` reads as 90. Non-finite results are treated
/// as absent.
pub fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Longest prefix of `s` (after leading whitespace) that forms a decimal
/// number: sign, digits, fraction, exponent.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy_accepts_numbers_and_bools() {
        assert_eq!(truthy(&json!(1)), Some(true));
        assert_eq!(truthy(&json!(true)), Some(true));
        assert_eq!(truthy(&json!(0)), Some(false));
        assert_eq!(truthy(&json!(false)), Some(false));
        assert_eq!(truthy(&json!(1.0)), Some(true));
    }

    #[test]
    fn test_truthy_everything_else_is_absent() {
        assert_eq!(truthy(&json!(null)), None);
        assert_eq!(truthy(&json!("1")), None);
        assert_eq!(truthy(&json!("true")), None);
        assert_eq!(truthy(&json!(2)), None);
        assert_eq!(truthy(&json!(-1)), None);
        assert_eq!(truthy(&json!([1])), None);
        assert_eq!(truthy(&json!({})), None);
    }

    #[test]
    fn test_numeric() {
        assert_eq!(numeric(&json!(42)), Some(42.0));
        assert_eq!(numeric(&json!(3.75)), Some(3.75));
        assert_eq!(numeric(&json!(" 90.5 ")), Some(90.5));
        assert_eq!(numeric(&json!("abc")), None);
        assert_eq!(numeric(&json!("NaN")), None);
        assert_eq!(numeric(&json!("inf")), None);
        assert_eq!(numeric(&json!(true)), None);
        assert_eq!(numeric(&json!(null)), None);
    }

    #[test]
    fn test_numeric_reads_leading_number() {
        assert_eq!(numeric(&json!("90deg")), Some(90.0));
        assert_eq!(numeric(&json!("3.7 V")), Some(3.7));
        assert_eq!(numeric(&json!("-5")), Some(-5.0));
        assert_eq!(numeric(&json!(".5")), Some(0.5));
        assert_eq!(numeric(&json!("7.")), Some(7.0));
        assert_eq!(numeric(&json!("1e2x")), Some(100.0));
        assert_eq!(numeric(&json!("12e")), Some(12.0));
        assert_eq!(numeric(&json!("1.5.2")), Some(1.5));
        assert_eq!(numeric(&json!("deg90")), None);
        assert_eq!(numeric(&json!("-")), None);
        assert_eq!(numeric(&json!(".")), None);
        assert_eq!(numeric(&json!("")), None);
        assert_eq!(numeric(&json!("1e999")), None);
    }
}
