//! Arbitrary-precision numeric helpers built on `bigdecimal`.
//!
//! Every numeric value in the evaluator is a `BigDecimal`. Nothing here
//! touches `f64`: scaling, rounding and rendering all work on the exact
//! integer mantissa and exponent.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

/// Default fixed-point scale exponent for scaled numbers (1e18).
pub const DEFAULT_MANTISSA_DECIMALS: u32 = 18;

/// 2^256 - 1, the largest unsigned 256-bit word.
pub const MAX_UINT256: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

/// Largest decimal exponent a literal may carry, and the widest exponent
/// [`to_plain_string`] writes out in full.
pub const MAX_EXPONENT: i64 = 10_000;

fn hex_digits(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// Parse a numeric literal.
///
/// Accepts decimal text with an optional exponent (`5`, `-1.25`, `100e18`)
/// and `0x`-prefixed hexadecimal integers. Surrounding whitespace is ignored.
pub fn parse_number(text: &str) -> Result<BigDecimal, String> {
    let s = text.trim();
    match hex_digits(s) {
        Some(hex) => BigInt::parse_bytes(hex.as_bytes(), 16)
            .map(BigDecimal::from)
            .ok_or_else(|| "not a number".to_string()),
        None => parse_decimal(s),
    }
}

/// Parse a decimal literal, rejecting hex and exponents beyond
/// [`MAX_EXPONENT`].
pub fn parse_decimal(text: &str) -> Result<BigDecimal, String> {
    let s = text.trim();
    if hex_digits(s).is_some() {
        return Err("not a decimal number".to_string());
    }
    let value = BigDecimal::from_str(s).map_err(|_| "not a number".to_string())?;
    let (_, scale) = value.as_bigint_and_exponent();
    if scale.unsigned_abs() > MAX_EXPONENT.unsigned_abs() {
        return Err(format!("exponent out of range (limit {MAX_EXPONENT})"));
    }
    Ok(value)
}

/// 10^decimals as an exact decimal.
pub fn scale_factor(decimals: u32) -> BigDecimal {
    BigDecimal::new(BigInt::one(), -i64::from(decimals))
}

/// Multiply by 10^decimals without any rounding.
pub fn to_scaled(value: &BigDecimal, decimals: u32) -> BigDecimal {
    value * scale_factor(decimals)
}

/// Number of significant figures written in a numeric literal.
///
/// Counts the digits of the text itself, not of the mathematical value:
/// one exponent suffix is dropped along with the decimal point, so
/// `5.1000` has five and `5e18` has one.
pub fn sig_figs(text: &str) -> u32 {
    let s = text.trim();
    let mantissa = match s.find(['e', 'E']) {
        Some(idx) => {
            let exp = s[idx + 1..].trim_start_matches(['+', '-']);
            if !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit()) {
                &s[..idx]
            } else {
                s
            }
        }
        None => s,
    };
    mantissa.chars().filter(|c| c.is_ascii_digit()).count() as u32
}

fn pow10(exp: u64) -> BigInt {
    num_traits::pow(BigInt::from(10u8), exp as usize)
}

/// Round half away from zero to the given scale (digits after the point).
///
/// Values that already fit in `new_scale` are returned unchanged.
pub fn round_half_up(value: &BigDecimal, new_scale: i64) -> BigDecimal {
    let (int, scale) = value.as_bigint_and_exponent();
    if new_scale >= scale {
        return value.clone();
    }
    let divisor = pow10((scale - new_scale) as u64);
    let mut quotient = &int / &divisor;
    let remainder = &int % &divisor;
    if remainder.abs() * BigInt::from(2u8) >= divisor {
        if int.is_negative() {
            quotient -= BigInt::one();
        } else {
            quotient += BigInt::one();
        }
    }
    BigDecimal::new(quotient, new_scale)
}

/// Round to `figures` significant digits, half away from zero.
pub fn round_sig_figs(value: &BigDecimal, figures: u32) -> BigDecimal {
    if value.is_zero() || figures == 0 {
        return BigDecimal::zero();
    }
    let (int, scale) = value.as_bigint_and_exponent();
    let digits = int.magnitude().to_string().len() as i64;
    let new_scale = scale - (digits - i64::from(figures));
    round_half_up(value, new_scale)
}

/// Round to a whole number, half away from zero.
pub fn round_to_integer(value: &BigDecimal) -> BigDecimal {
    round_half_up(value, 0)
}

/// Render without exponent notation and without trailing fractional zeros.
///
/// Exponents wider than [`MAX_EXPONENT`] fall back to `<digits>e<exp>`.
pub fn to_plain_string(value: &BigDecimal) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    let (int, scale) = value.as_bigint_and_exponent();
    let sign = if int.is_negative() { "-" } else { "" };
    let digits = int.magnitude().to_string();

    if scale.unsigned_abs() > MAX_EXPONENT.unsigned_abs() {
        return format!("{}{}e{}", sign, digits, -i128::from(scale));
    }
    if scale <= 0 {
        return format!("{}{}{}", sign, digits, "0".repeat((-scale) as usize));
    }

    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, frac) = padded.split_at(padded.len() - scale);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}{}", sign, whole)
    } else {
        format!("{}{}.{}", sign, whole, frac)
    }
}
