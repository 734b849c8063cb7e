use actix_web::{get, web, Responder};
use num_bigint::BigInt;
use serde::Serialize;

use crate::{
    configuration::{AppState, State},
    error::Error,
    handler::loans::fetch_loans,
    helpers::{
        formatting::{format_amount, to_dollars_formatted},
        health_factor::{contract_health_factor, HealthBand},
    },
    model::{Loan, PerCurrency, Ticker},
};

#[get("/loans/{address}")]
async fn index(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    let address = path.into_inner();
    let loans = fetch_loans(&state.manager, &state.bindings, &address).await;
    let prices = state.pools.snapshot().loaded_prices();

    let loans = loans
        .iter()
        .map(|loan| LoanView::new(loan, prices.as_ref()))
        .collect::<Vec<LoanView>>();

    Ok(web::Json(loans))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanView {
    pub borrowed_ticker: Ticker,
    #[serde(with = "crate::types::big_int")]
    pub borrowed_amount: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub unpaid_interest: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub balance: BigInt,
    pub balance_formatted: String,
    pub balance_usd: Option<String>,
    pub collateral_ticker: Ticker,
    #[serde(with = "crate::types::big_int")]
    pub collateral_amount: BigInt,
    pub collateral_formatted: String,
    pub collateral_usd: Option<String>,
    pub health_factor: f64,
    pub health: &'static str,
    pub health_bars: u8,
}

impl LoanView {
    pub fn new(loan: &Loan, prices: Option<&PerCurrency<BigInt>>) -> Self {
        let balance = loan.balance();
        let health_factor = contract_health_factor(&loan.health_factor);
        let band = HealthBand::classify(health_factor);
        let dollars = |ticker: Ticker, amount: &BigInt| {
            prices.map(|prices| to_dollars_formatted(prices.get(ticker), amount))
        };

        LoanView {
            borrowed_ticker: loan.borrowed_ticker,
            borrowed_amount: loan.borrowed_amount.clone(),
            unpaid_interest: loan.unpaid_interest.clone(),
            balance_formatted: format_amount(&balance),
            balance_usd: dollars(loan.borrowed_ticker, &balance),
            balance,
            collateral_ticker: loan.collateral_ticker,
            collateral_amount: loan.collateral_amount.clone(),
            collateral_formatted: format_amount(&loan.collateral_amount),
            collateral_usd: dollars(loan.collateral_ticker, &loan.collateral_amount),
            health_factor,
            health: band.compact_text(),
            health_bars: band.bars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_view() {
        let loan = Loan {
            borrower: String::from("GUSER"),
            borrowed_amount: BigInt::from(100_000_000),
            borrowed_ticker: Ticker::Usdc,
            collateral_amount: BigInt::from(1_500_000_000_i64),
            collateral_ticker: Ticker::Xlm,
            health_factor: BigInt::from(15_000_000),
            unpaid_interest: BigInt::from(5_000_000),
        };
        let prices = PerCurrency::from_fn(|ticker| match ticker {
            Ticker::Xlm => BigInt::from(10_000_000_000_000_i64),
            Ticker::Usdc | Ticker::Eurc => BigInt::from(100_000_000_000_000_i64),
        });

        let view = LoanView::new(&loan, Some(&prices));
        assert_eq!(view.balance, BigInt::from(105_000_000));
        assert_eq!(view.balance_formatted, "10.5");
        assert_eq!(view.balance_usd.as_deref(), Some("$10.50"));
        assert_eq!(view.collateral_usd.as_deref(), Some("$15.00"));
        assert_eq!(view.health_factor, 1.5);
        assert_eq!(view.health, "Excellent");
        assert_eq!(view.health_bars, 4);

        assert_eq!(LoanView::new(&loan, None).balance_usd, None);
    }
}
