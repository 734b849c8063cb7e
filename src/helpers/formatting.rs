//! Display helpers for amounts, dollar values and interest rates.
//!
//! Nothing produced here is fed back into transaction amounts.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::Error;

use super::converters::SCALAR_7;

/// `(10^7)^2 * 10^5`, dividing `price * amount` by it yields cents.
pub fn cents_scalar() -> BigInt {
    BigInt::from(SCALAR_7).pow(2) * BigInt::from(100_000)
}

/// Interest rates are percentages scaled by this value, `200_000` is 2%.
pub const RATE_SCALAR_DECIMALS: u32 = 5;

/// Supply yield shown to lenders is this many tenths of the borrow APR.
pub const APY_FROM_APR_TENTHS: i64 = 9;

const TEN_K: i64 = 10_000;
const ONE_M: i64 = 1_000_000;

/// Renders `value / 10^scale` with `digits` decimals, rounding half up.
pub fn format_fixed(value: &BigInt, scale: u32, digits: u32) -> String {
    let negative = value.is_negative();
    let value = value.abs();

    let rounded = if scale >= digits {
        let divisor = BigInt::from(10).pow(scale - digits);
        (&value + &divisor / 2) / &divisor
    } else {
        value * BigInt::from(10).pow(digits - scale)
    };

    let digits = digits as usize;
    let text = format!("{:0>width$}", rounded.to_string(), width = digits + 1);
    let (integer, fraction) = text.split_at(text.len() - digits);
    let sign = if negative && !rounded.is_zero() { "-" } else { "" };

    if fraction.is_empty() {
        format!("{}{}", sign, integer)
    } else {
        format!("{}{}.{}", sign, integer, fraction)
    }
}

pub fn format_amount(amount: &BigInt) -> String {
    if amount.is_zero() {
        return String::from("0");
    }

    let scalar = BigInt::from(SCALAR_7);

    if *amount > BigInt::from(ONE_M) * &scalar {
        return format!("{}M", format_fixed(amount, 13, 2));
    }

    if *amount > BigInt::from(TEN_K) * &scalar {
        return format!("{}K", format_fixed(amount, 10, 1));
    }

    format_fixed(amount, 7, 1)
}

pub fn to_cents(price: &BigInt, amount: &BigInt) -> BigInt {
    (price * amount) / cents_scalar()
}

pub fn from_cents(price: &BigInt, cents: &BigInt) -> Result<BigInt, Error> {
    if price.is_zero() {
        return Err(Error::ZeroPrice);
    }

    Ok((cents * cents_scalar()) / price)
}

pub fn format_cent_amount(cents: &BigInt) -> String {
    if cents.is_zero() {
        return String::from("$0");
    }

    let dollars_in_cents = BigInt::from(100);

    if *cents > BigInt::from(ONE_M) * &dollars_in_cents {
        return format!("${} M", format_fixed(cents, 8, 2));
    }

    if *cents > BigInt::from(TEN_K) * &dollars_in_cents {
        return format!("${} K", format_fixed(cents, 5, 1));
    }

    format!("${}", format_fixed(cents, 2, 2))
}

pub fn to_dollars_formatted(price: &BigInt, amount: &BigInt) -> String {
    format_cent_amount(&to_cents(price, amount))
}

pub fn format_apr(rate: &BigInt) -> String {
    format!("{}%", format_fixed(rate, RATE_SCALAR_DECIMALS, 2))
}

pub fn format_apy(rate: &BigInt) -> String {
    // tenths add one decimal to the rate scale
    let apy = rate * APY_FROM_APR_TENTHS;
    format!("{}%", format_fixed(&apy, RATE_SCALAR_DECIMALS + 1, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(value: i64) -> BigInt {
        BigInt::from(value)
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(&big(0)), "0");
        assert_eq!(format_amount(&big(125_000_000)), "12.5");
        assert_eq!(format_amount(&big(4_000)), "0.0");
        assert_eq!(format_amount(&big(123_456_789_012)), "12.3K");
        assert_eq!(format_amount(&big(25_000_000_000_000)), "2.50M");
    }

    #[test]
    fn test_format_amount_thresholds_are_exclusive() {
        assert_eq!(format_amount(&big(100_000_000_000)), "10000.0");
        assert_eq!(format_amount(&big(10_000_000_000_000)), "1000.0K");
    }

    #[test]
    fn test_to_cents() {
        assert_eq!(to_cents(&big(123_456_789), &big(0)), big(0));

        // one whole token priced at $0.10
        let price = big(10_000_000_000_000);
        assert_eq!(to_cents(&price, &big(10_000_000)), big(10));
        assert_eq!(to_cents(&price, &big(9_999_999)), big(9));
    }

    #[test]
    fn test_from_cents() {
        let price = big(10_000_000_000_000);
        assert_eq!(from_cents(&price, &big(10)).unwrap(), big(10_000_000));
        assert!(matches!(from_cents(&big(0), &big(10)), Err(Error::ZeroPrice)));
    }

    #[test]
    fn test_from_cents_recovers_amount() {
        let price = big(1_234_567_890_123);
        for amount in [10_000_000_i64, 123_456_789, 987_654_321_000] {
            let amount = big(amount);
            let cents = to_cents(&price, &amount);
            let back = from_cents(&price, &cents).unwrap();
            assert!(back <= amount);

            // one cent worth of tokens is the largest possible loss
            let one_cent = from_cents(&price, &big(1)).unwrap();
            assert!(&amount - &back <= one_cent + 1);
        }
    }

    #[test]
    fn test_format_cent_amount() {
        assert_eq!(format_cent_amount(&big(0)), "$0");
        assert_eq!(format_cent_amount(&big(1_234)), "$12.34");
        assert_eq!(format_cent_amount(&big(1_234_567)), "$12.3 K");
        assert_eq!(format_cent_amount(&big(250_000_000)), "$2.50 M");
    }

    #[test]
    fn test_to_dollars_formatted() {
        let price = big(10_000_000_000_000);
        assert_eq!(to_dollars_formatted(&price, &big(150_000_000)), "$1.50");
    }

    #[test]
    fn test_format_apr_and_apy() {
        assert_eq!(format_apr(&big(200_000)), "2.00%");
        assert_eq!(format_apr(&big(750_000)), "7.50%");
        assert_eq!(format_apy(&big(200_000)), "1.80%");
        assert_eq!(format_apy(&big(750_000)), "6.75%");
    }

    #[test]
    fn test_format_fixed_rounds_half_up() {
        assert_eq!(format_fixed(&big(125), 2, 1), "1.3");
        assert_eq!(format_fixed(&big(124), 2, 1), "1.2");
        assert_eq!(format_fixed(&big(5), 0, 2), "5.00");
        assert_eq!(format_fixed(&big(-125), 2, 1), "-1.3");
    }
}
