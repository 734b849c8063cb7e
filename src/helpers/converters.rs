//! Conversions between user entered decimal strings and stroops.
//!
//! Stellar assets carry 7 decimal places. One stroop is the smallest unit,
//! 10,000,000 stroops make up one whole token.

use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::Signed;

use crate::error::Error;

pub const DECIMALS: usize = 7;

pub const SCALAR_7: i64 = 10_000_000;

pub fn scalar_7() -> BigInt {
    BigInt::from(SCALAR_7)
}

/// Parses `"12.5"` into `125_000_000`.
///
/// Fractional digits beyond the seventh are truncated, never rounded.
pub fn decimal_string_to_stroops(value: &str) -> Result<BigInt, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::InvalidAmount(String::from("empty amount")));
    }

    let (integer, fraction) = match value.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (value, ""),
    };

    if fraction.chars().any(|c| !c.is_ascii_digit()) {
        return Err(Error::InvalidAmount(value.to_owned()));
    }

    let fraction: String = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(DECIMALS)
        .collect();

    let integer = match integer {
        "" => "0",
        "-" => "-0",
        integer => integer,
    };

    BigInt::from_str(&format!("{}{}", integer, fraction))
        .map_err(|_| Error::InvalidAmount(value.to_owned()))
}

/// Formats `100_000_000` as `"10"` and `400` as `"0.00004"`.
pub fn stroops_to_decimal_string(stroops: &BigInt) -> String {
    if stroops.is_negative() {
        return format!("-{}", stroops_to_decimal_string(&stroops.abs()));
    }

    let digits = format!("{:0>width$}", stroops.to_string(), width = DECIMALS + 1);
    let (integer, fraction) = digits.split_at(digits.len() - DECIMALS);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        integer.to_owned()
    } else {
        format!("{}.{}", integer, fraction)
    }
}
