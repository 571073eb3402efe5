//! Money Coercion and Formatting
//!
//! Cart payloads arrive with prices as JSON numbers or as free-form strings
//! ("12,50", "$9.99"), so every amount goes through one lossy coercion
//! function before it is used in a calculation.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

/// Currency code used when no configured default is available.
pub const FALLBACK_CURRENCY: &str = "CAD";

/// Lossily coerce a JSON value to a decimal amount.
///
/// Strings are cleaned to digits, commas, periods and minus signs. A comma
/// acting as the decimal separator (no period after it) becomes a period;
/// remaining commas are treated as thousands separators and dropped.
/// Anything that still fails to parse coerces to zero. This never errors:
/// callers rely on parse failure degrading to zero rather than branching.
#[must_use]
pub fn to_number(raw: &Value) -> Decimal {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .and_then(Decimal::from_f64)
            .unwrap_or(Decimal::ZERO),
        Value::String(s) => parse_amount(s),
        _ => Decimal::ZERO,
    }
}

fn parse_amount(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let normalized = match cleaned.rfind(',') {
        Some(pos) if !cleaned[pos + 1..].contains('.') => {
            let mut s = String::with_capacity(cleaned.len());
            s.push_str(&cleaned[..pos].replace(',', ""));
            s.push('.');
            s.push_str(&cleaned[pos + 1..]);
            s
        }
        _ => cleaned.replace(',', ""),
    };

    normalized.parse().unwrap_or(Decimal::ZERO)
}

/// Format an amount to two decimal places followed by the uppercase
/// currency code, e.g. `25.00 CAD`. An empty code falls back to
/// [`FALLBACK_CURRENCY`].
#[must_use]
pub fn format_currency(amount: Decimal, code: &str) -> String {
    let code = if code.is_empty() {
        FALLBACK_CURRENCY.to_string()
    } else {
        code.to_uppercase()
    };
    format!("{amount:.2} {code}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_comma_decimal_separator() {
        assert_eq!(to_number(&json!("12,50")), dec!(12.5));
    }

    #[test]
    fn test_garbage_coerces_to_zero() {
        assert_eq!(to_number(&json!("abc")), Decimal::ZERO);
        assert_eq!(to_number(&json!(null)), Decimal::ZERO);
        assert_eq!(to_number(&json!([1, 2])), Decimal::ZERO);
        assert_eq!(to_number(&json!("--5")), Decimal::ZERO);
    }

    #[test]
    fn test_currency_symbols_stripped() {
        assert_eq!(to_number(&json!("$9.99")), dec!(9.99));
        assert_eq!(to_number(&json!("25.00 CAD")), dec!(25));
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(to_number(&json!("1,234.56")), dec!(1234.56));
        assert_eq!(to_number(&json!("1.234")), dec!(1.234));
    }

    #[test]
    fn test_json_numbers() {
        assert_eq!(to_number(&json!(12.5)), dec!(12.5));
        assert_eq!(to_number(&json!(3)), dec!(3));
        assert_eq!(to_number(&json!(-1)), dec!(-1));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(25), "cad"), "25.00 CAD");
        assert_eq!(format_currency(dec!(12.5), "USD"), "12.50 USD");
        assert_eq!(format_currency(Decimal::ZERO, ""), "0.00 CAD");
    }

    #[test]
    fn test_round_trip() {
        let formatted = format_currency(dec!(12.5), "CAD");
        let amount = formatted.split(' ').next().unwrap();
        assert_eq!(to_number(&json!(amount)), dec!(12.5));
    }
}
