//! Collateralization model used before a loan is submitted.
//!
//! The health factor is the collateral value divided by the loan value, both
//! in cents. It is a display value only, amounts sent to the loan manager are
//! always computed with integer arithmetic.

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    model::{BalanceRecord, PerCurrency, Ticker},
};

use super::{
    converters::SCALAR_7,
    formatting::{from_cents, to_cents},
};

pub const HEALTH_FACTOR_MIN_THRESHOLD: f64 = 1.25;
pub const HEALTH_FACTOR_GOOD_THRESHOLD: f64 = 1.35;
pub const HEALTH_FACTOR_EXCELLENT_THRESHOLD: f64 = 1.45;

/// Target used when suggesting collateral, as a percentage.
pub const HEALTH_FACTOR_AUTO_THRESHOLD_PERCENT: i64 = 140;

pub const AUTO_COLLATERAL_MARGIN_CENTS: i64 = 100;

pub fn health_factor(collateral_cents: &BigInt, loan_cents: &BigInt) -> f64 {
    if loan_cents.is_zero() {
        return 0.0;
    }

    let collateral = collateral_cents.to_f64().unwrap_or(0.0);
    let loan = loan_cents.to_f64().unwrap_or(0.0);

    collateral / loan
}

/// Health factor reported by the loan manager, scaled by 10^7.
pub fn contract_health_factor(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(0.0) / SCALAR_7 as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Liquidates,
    AtRisk,
    Good,
    Excellent,
}

impl HealthBand {
    pub fn classify(health_factor: f64) -> Self {
        if health_factor < HEALTH_FACTOR_MIN_THRESHOLD {
            HealthBand::Liquidates
        } else if health_factor < HEALTH_FACTOR_GOOD_THRESHOLD {
            HealthBand::AtRisk
        } else if health_factor < HEALTH_FACTOR_EXCELLENT_THRESHOLD {
            HealthBand::Good
        } else {
            HealthBand::Excellent
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            HealthBand::Liquidates => "Would liquidate immediately",
            HealthBand::AtRisk => "At risk of liquidation",
            HealthBand::Good => "Good",
            HealthBand::Excellent => "Excellent",
        }
    }

    pub fn compact_text(&self) -> &'static str {
        match self {
            HealthBand::Liquidates => "Liquidates",
            HealthBand::AtRisk => "At risk",
            HealthBand::Good => "Good",
            HealthBand::Excellent => "Excellent",
        }
    }

    /// Filled segments of the four segment gauge.
    pub fn bars(&self) -> u8 {
        match self {
            HealthBand::Liquidates => 1,
            HealthBand::AtRisk => 2,
            HealthBand::Good => 3,
            HealthBand::Excellent => 4,
        }
    }
}

/// Collateral needed to reach the auto threshold plus a one dollar margin,
/// capped at what the wallet holds.
pub fn suggest_collateral(
    loan_price: &BigInt,
    loan_amount: &BigInt,
    collateral_price: &BigInt,
    max_available: &BigInt,
) -> Result<BigInt, Error> {
    let loan_cents = to_cents(loan_price, loan_amount);

    let target = BigDecimal::new(loan_cents, 0)
        * BigDecimal::new(BigInt::from(HEALTH_FACTOR_AUTO_THRESHOLD_PERCENT), 2);
    let (target, _) = target
        .with_scale_round(0, RoundingMode::Ceiling)
        .as_bigint_and_exponent();

    let cents = target + AUTO_COLLATERAL_MARGIN_CENTS;
    let amount = from_cents(collateral_price, &cents)?;

    if amount > *max_available {
        return Ok(max_available.clone());
    }

    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub loan_ticker: Ticker,
    #[serde(with = "crate::types::big_int")]
    pub loan_amount: BigInt,
    pub collateral_ticker: Ticker,
    #[serde(with = "crate::types::big_int")]
    pub collateral_amount: BigInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowBlocker {
    NoTrustline,
    SameCurrency,
    ZeroLoan,
    ZeroCollateral,
    InsufficientCollateral,
    UnhealthyLoan,
}

impl BorrowBlocker {
    pub fn message(&self) -> &'static str {
        match self {
            BorrowBlocker::NoTrustline => "Create a trustline for the borrowed asset first",
            BorrowBlocker::SameCurrency => "Loan and collateral must be different assets",
            BorrowBlocker::ZeroLoan => "Enter an amount to borrow",
            BorrowBlocker::ZeroCollateral => "Enter a collateral amount",
            BorrowBlocker::InsufficientCollateral => "Not enough collateral in the wallet",
            BorrowBlocker::UnhealthyLoan => "Loan would be liquidated immediately",
        }
    }
}

/// Valuation of a prospective loan and the reasons it can't be sent yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorrowQuote {
    pub request: BorrowRequest,
    #[serde(with = "crate::types::big_int")]
    pub loan_cents: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub collateral_cents: BigInt,
    pub health_factor: f64,
    pub band: HealthBand,
    pub blockers: Vec<BorrowBlocker>,
}

impl BorrowQuote {
    pub fn new(
        prices: &PerCurrency<BigInt>,
        request: BorrowRequest,
        balances: &BalanceRecord,
    ) -> Self {
        let loan_cents = to_cents(prices.get(request.loan_ticker), &request.loan_amount);
        let collateral_cents = to_cents(
            prices.get(request.collateral_ticker),
            &request.collateral_amount,
        );
        let health_factor = health_factor(&collateral_cents, &loan_cents);
        let band = HealthBand::classify(health_factor);

        let mut blockers = Vec::new();

        if !balances.get(request.loan_ticker).has_trustline() {
            blockers.push(BorrowBlocker::NoTrustline);
        }
        if request.loan_ticker == request.collateral_ticker {
            blockers.push(BorrowBlocker::SameCurrency);
        }
        if !request.loan_amount.is_positive() {
            blockers.push(BorrowBlocker::ZeroLoan);
        }
        if !request.collateral_amount.is_positive() {
            blockers.push(BorrowBlocker::ZeroCollateral);
        } else if request.collateral_amount
            > balances.get(request.collateral_ticker).amount()
        {
            blockers.push(BorrowBlocker::InsufficientCollateral);
        }
        if health_factor < HEALTH_FACTOR_MIN_THRESHOLD {
            blockers.push(BorrowBlocker::UnhealthyLoan);
        }

        BorrowQuote {
            request,
            loan_cents,
            collateral_cents,
            health_factor,
            band,
            blockers,
        }
    }

    pub fn can_borrow(&self) -> bool {
        self.blockers.is_empty()
    }

    /// Collateral the wallet should post for this loan.
    pub fn suggested_collateral(
        &self,
        prices: &PerCurrency<BigInt>,
        balances: &BalanceRecord,
    ) -> Result<BigInt, Error> {
        suggest_collateral(
            prices.get(self.request.loan_ticker),
            &self.request.loan_amount,
            prices.get(self.request.collateral_ticker),
            &balances.get(self.request.collateral_ticker).amount(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Balance;

    // $0.10 per XLM, $1.00 per USDC and EURC
    fn prices() -> PerCurrency<BigInt> {
        PerCurrency::from_fn(|ticker| match ticker {
            Ticker::Xlm => BigInt::from(10_000_000_000_000_i64),
            Ticker::Usdc | Ticker::Eurc => BigInt::from(100_000_000_000_000_i64),
        })
    }

    fn balances(xlm: i64, usdc: Option<i64>) -> BalanceRecord {
        PerCurrency::from_fn(|ticker| match ticker {
            Ticker::Xlm => Balance::Trustline {
                balance: BigInt::from(xlm),
            },
            Ticker::Usdc => match usdc {
                Some(balance) => Balance::Trustline {
                    balance: BigInt::from(balance),
                },
                None => Balance::NoTrustline,
            },
            Ticker::Eurc => Balance::NoTrustline,
        })
    }

    fn tokens(value: i64) -> BigInt {
        BigInt::from(value) * SCALAR_7
    }

    #[test]
    fn test_health_factor() {
        assert_eq!(health_factor(&BigInt::from(150), &BigInt::from(100)), 1.5);
        assert_eq!(health_factor(&BigInt::from(150), &BigInt::zero()), 0.0);
    }

    #[test]
    fn test_classify() {
        assert_eq!(HealthBand::classify(1.0), HealthBand::Liquidates);
        assert_eq!(HealthBand::classify(1.30), HealthBand::AtRisk);
        assert_eq!(HealthBand::classify(1.40), HealthBand::Good);
        assert_eq!(HealthBand::classify(1.50), HealthBand::Excellent);

        assert_eq!(HealthBand::classify(1.25), HealthBand::AtRisk);
        assert_eq!(HealthBand::classify(1.45), HealthBand::Excellent);
        assert_eq!(HealthBand::classify(0.0), HealthBand::Liquidates);
    }

    #[test]
    fn test_band_texts() {
        assert_eq!(HealthBand::Liquidates.text(), "Would liquidate immediately");
        assert_eq!(HealthBand::AtRisk.compact_text(), "At risk");
        assert_eq!(HealthBand::Excellent.bars(), 4);
    }

    #[test]
    fn test_contract_health_factor() {
        assert_eq!(contract_health_factor(&BigInt::from(14_000_000)), 1.4);
    }

    #[test]
    fn test_suggest_collateral() {
        let prices = prices();

        // 100 USDC is 10_000 cents, 1.40x plus margin is 14_100 cents or 1_410 XLM
        let suggestion = suggest_collateral(
            prices.get(Ticker::Usdc),
            &tokens(100),
            prices.get(Ticker::Xlm),
            &tokens(1_000_000),
        )
        .unwrap();
        assert_eq!(suggestion, tokens(1_410));
    }

    #[test]
    fn test_suggest_collateral_rounds_up() {
        let prices = prices();

        // 0.07 USDC is 7 cents, 1.40x is 9.8 which rounds up to 10
        let suggestion = suggest_collateral(
            prices.get(Ticker::Usdc),
            &BigInt::from(700_000),
            prices.get(Ticker::Usdc),
            &tokens(1_000),
        )
        .unwrap();
        assert_eq!(suggestion, BigInt::from(11_000_000));
    }

    #[test]
    fn test_suggest_collateral_clamps_to_balance() {
        let prices = prices();

        let suggestion = suggest_collateral(
            prices.get(Ticker::Usdc),
            &tokens(100),
            prices.get(Ticker::Xlm),
            &tokens(500),
        )
        .unwrap();
        assert_eq!(suggestion, tokens(500));
    }

    #[test]
    fn test_suggest_collateral_zero_price() {
        let result = suggest_collateral(
            &BigInt::from(1),
            &tokens(1),
            &BigInt::zero(),
            &tokens(1),
        );
        assert!(matches!(result, Err(Error::ZeroPrice)));
    }

    #[test]
    fn test_borrow_quote_healthy() {
        let prices = prices();
        let balances = balances(100_000_000_000, Some(0));
        let request = BorrowRequest {
            loan_ticker: Ticker::Usdc,
            loan_amount: tokens(100),
            collateral_ticker: Ticker::Xlm,
            collateral_amount: tokens(1_500),
        };

        let quote = BorrowQuote::new(&prices, request, &balances);

        assert_eq!(quote.loan_cents, BigInt::from(10_000));
        assert_eq!(quote.collateral_cents, BigInt::from(15_000));
        assert_eq!(quote.band, HealthBand::Excellent);
        assert!(quote.can_borrow());
        assert_eq!(
            quote.suggested_collateral(&prices, &balances).unwrap(),
            tokens(1_410)
        );
    }

    #[test]
    fn test_borrow_quote_blockers() {
        let prices = prices();
        let balances = balances(1_000_000_000, None);
        let request = BorrowRequest {
            loan_ticker: Ticker::Usdc,
            loan_amount: tokens(100),
            collateral_ticker: Ticker::Xlm,
            collateral_amount: tokens(1_000),
        };

        let quote = BorrowQuote::new(&prices, request, &balances);

        assert!(!quote.can_borrow());
        assert_eq!(
            quote.blockers,
            vec![
                BorrowBlocker::NoTrustline,
                BorrowBlocker::InsufficientCollateral,
                BorrowBlocker::UnhealthyLoan,
            ]
        );
    }

    #[test]
    fn test_borrow_quote_zero_amounts() {
        let prices = prices();
        let balances = balances(0, Some(0));
        let request = BorrowRequest {
            loan_ticker: Ticker::Usdc,
            loan_amount: BigInt::zero(),
            collateral_ticker: Ticker::Xlm,
            collateral_amount: BigInt::zero(),
        };

        let quote = BorrowQuote::new(&prices, request, &balances);

        assert_eq!(quote.health_factor, 0.0);
        assert!(quote.blockers.contains(&BorrowBlocker::ZeroLoan));
        assert!(quote.blockers.contains(&BorrowBlocker::ZeroCollateral));
    }
}
