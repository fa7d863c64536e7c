use bigdecimal::{BigDecimal, Signed};
use ethers::types::U256;
use num_bigint::{BigInt, BigUint, Sign};
use serde_json::Value;
use std::str::FromStr;

use crate::error::EncodingError;

/// Decimal digits in 2^256 - 1.
const MAX_UINT_DIGITS: i64 = 78;

/// Parses a decimal string into a `U256`.
///
/// Integral values only: no rounding, no wrapping past 256 bits. Only plain
/// digits are accepted, so `+5` and `1e3` are `NotNumeric`.
pub fn parse_uint(value: &str) -> Result<U256, EncodingError> {
    integral_to_u256(&parse_plain(value)?, value)
}

/// Converts a human amount such as `"1.5"` into base units for a token with
/// `decimals` places. Digits beyond `decimals` are an error.
pub fn parse_units(value: &str, decimals: u32) -> Result<U256, EncodingError> {
    let decimal = parse_plain(value)?;
    let scale = BigDecimal::new(BigInt::from(1), -(decimals as i64));
    integral_to_u256(&(decimal * scale), value)
}

/// Inverse of [`parse_units`]. Trailing zeros are dropped.
pub fn format_units(value: U256, decimals: u32) -> String {
    let formatted = BigDecimal::new(u256_to_bigint(value), decimals as i64).to_string();
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted
    }
}

/// Decimal string form of a `U256`.
pub fn format_uint(value: U256) -> String {
    value.to_string()
}

/// Converts U256 to BigDecimal
pub fn to_big_decimal(value: U256) -> BigDecimal {
    BigDecimal::new(u256_to_bigint(value), 0)
}

pub fn biguint_to_u256(value: &BigUint) -> Result<U256, EncodingError> {
    if value.bits() > 256 {
        return Err(EncodingError::Overflow(value.to_string()));
    }
    Ok(U256::from_big_endian(&value.to_bytes_be()))
}

/// Reads a uint out of loosely typed JSON: a number, a decimal or `0x` hex
/// string, or a `{ "hex": "0x.." }` object as some wallets serialize big
/// numbers.
pub fn uint_from_json(value: &Value) -> Result<U256, EncodingError> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => Ok(U256::from(n)),
            None => parse_uint(&n.to_string()),
        },
        Value::String(s) => match strip_hex_prefix(s) {
            Some(hex) => U256::from_str_radix(hex, 16)
                .map_err(|_| EncodingError::NotNumeric(s.clone())),
            None => parse_uint(s),
        },
        Value::Object(map) => match map.get("hex") {
            Some(hex @ Value::String(_)) => uint_from_json(hex),
            _ => Err(EncodingError::NotNumeric(value.to_string())),
        },
        _ => Err(EncodingError::NotNumeric(value.to_string())),
    }
}

/// Strips a `0x` or `0X` prefix, if present.
pub fn strip_hex_prefix(value: &str) -> Option<&str> {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))
}

/// Hex body of `value` with any `0x`/`0X` prefix removed.
pub fn hex_body(value: &str) -> &str {
    strip_hex_prefix(value).unwrap_or(value)
}

/// `[-]digits[.digits]` and nothing else.
fn parse_plain(value: &str) -> Result<BigDecimal, EncodingError> {
    let trimmed = value.trim();
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if integer.is_empty() || !digits(integer) || !digits(fraction) {
        return Err(EncodingError::NotNumeric(value.to_string()));
    }
    BigDecimal::from_str(trimmed).map_err(|_| EncodingError::NotNumeric(value.to_string()))
}

fn integral_to_u256(decimal: &BigDecimal, original: &str) -> Result<U256, EncodingError> {
    if decimal.is_negative() {
        return Err(EncodingError::Negative(original.to_string()));
    }
    // rescaling would materialize 10^-exponent
    let (digits, exponent) = decimal.as_bigint_and_exponent();
    if exponent < -MAX_UINT_DIGITS {
        return match digits.sign() {
            Sign::NoSign => Ok(U256::zero()),
            _ => Err(EncodingError::Overflow(original.to_string())),
        };
    }
    let integral = decimal.with_scale(0);
    if &integral != decimal {
        return Err(EncodingError::Fractional(original.to_string()));
    }
    let (digits, _) = integral.as_bigint_and_exponent();
    let (_, magnitude) = digits.into_parts();
    biguint_to_u256(&magnitude).map_err(|_| EncodingError::Overflow(original.to_string()))
}

fn u256_to_bigint(value: U256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_integers() {
        assert_eq!(parse_uint("1000").unwrap(), U256::from(1000u64));
        assert_eq!(parse_uint(" 0 ").unwrap(), U256::zero());
    }

    #[test]
    fn parses_full_256_bit_range() {
        let max = U256::MAX.to_string();
        assert_eq!(parse_uint(&max).unwrap(), U256::MAX);
    }

    #[test]
    fn rejects_values_above_256_bits() {
        // 2^256
        let too_big = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(matches!(parse_uint(too_big), Err(EncodingError::Overflow(_))));
    }

    #[test]
    fn rejects_fractions_instead_of_flooring() {
        assert!(matches!(parse_uint("10.5"), Err(EncodingError::Fractional(_))));
        // trailing zeros are still integral
        assert_eq!(parse_uint("10.000").unwrap(), U256::from(10u64));
    }

    #[test]
    fn rejects_non_numeric_and_negative() {
        assert!(matches!(parse_uint("abc"), Err(EncodingError::NotNumeric(_))));
        assert!(matches!(parse_uint(""), Err(EncodingError::NotNumeric(_))));
        assert!(matches!(parse_uint("-1"), Err(EncodingError::Negative(_))));
        assert!(matches!(parse_uint("+5"), Err(EncodingError::NotNumeric(_))));
        assert!(matches!(parse_uint("1e3"), Err(EncodingError::NotNumeric(_))));
        assert!(matches!(parse_uint(".5"), Err(EncodingError::NotNumeric(_))));
    }

    #[test]
    fn huge_exponents_fail_fast() {
        assert!(matches!(
            parse_uint("1e100000000"),
            Err(EncodingError::NotNumeric(_) | EncodingError::Overflow(_))
        ));
        assert!(matches!(parse_units("1", u32::MAX), Err(EncodingError::Overflow(_))));
        assert_eq!(parse_units("0", u32::MAX).unwrap(), U256::zero());
    }

    #[test]
    fn hex_prefix_in_either_case() {
        assert_eq!(hex_body("0xff"), "ff");
        assert_eq!(hex_body("0XFF"), "FF");
        assert_eq!(hex_body("ff"), "ff");
        assert_eq!(uint_from_json(&json!("0X0F")).unwrap(), U256::from(15u64));
    }

    #[test]
    fn units_round_trip_without_rounding() {
        let wei = parse_units("1.5", 18).unwrap();
        assert_eq!(wei, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(format_units(wei, 18), "1.5");
        assert_eq!(format_units(U256::from(1_000_000u64), 6), "1");
        assert!(matches!(parse_units("0.0000001", 6), Err(EncodingError::Fractional(_))));
    }

    #[test]
    fn reads_json_numeric_shapes() {
        assert_eq!(uint_from_json(&json!(15)).unwrap(), U256::from(15u64));
        assert_eq!(uint_from_json(&json!("15")).unwrap(), U256::from(15u64));
        assert_eq!(uint_from_json(&json!("0x0f")).unwrap(), U256::from(15u64));
        assert_eq!(
            uint_from_json(&json!({"type": "BigNumber", "hex": "0x0f"})).unwrap(),
            U256::from(15u64)
        );
        assert!(uint_from_json(&json!(null)).is_err());
    }

    #[test]
    fn big_decimal_conversion_keeps_value() {
        assert_eq!(to_big_decimal(U256::from(42u64)), BigDecimal::from(42));
    }
}
