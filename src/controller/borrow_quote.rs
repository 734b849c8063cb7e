use actix_web::{post, web, Responder};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::{
    configuration::{AppState, State},
    error::Error,
    handler::wallet_state::fetch_wallet_state,
    helpers::{
        converters::{decimal_string_to_stroops, stroops_to_decimal_string},
        formatting::format_cent_amount,
        health_factor::{BorrowQuote, BorrowRequest},
    },
    model::{BalanceRecord, PerCurrency, Ticker},
};

/// Amounts are decimal strings in whole tokens. Without a collateral
/// amount the suggested collateral is quoted.
#[derive(Debug, Clone, Deserialize)]
pub struct Body {
    pub address: String,
    pub loan_ticker: Ticker,
    pub loan_amount: String,
    pub collateral_ticker: Ticker,
    pub collateral_amount: Option<String>,
}

#[post("/borrow/quote")]
async fn index(
    state: web::Data<AppState<State>>,
    body: web::Json<Body>,
) -> Result<impl Responder, Error> {
    let body = body.into_inner();
    let prices = state.pools.snapshot().loaded_prices().ok_or_else(|| {
        Error::PoolNotLoaded(String::from("prices are still loading"))
    })?;

    let wallet = state
        .wallet_cache
        .get_or_fetch(&body.address, || {
            fetch_wallet_state(&state.horizon, &state.bindings, &body.address)
        })
        .await?;

    let response = quote(&prices, &wallet.balances, &body)?;

    Ok(web::Json(response))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub quote: BorrowQuote,
    pub health: &'static str,
    pub health_bars: u8,
    pub loan_usd: String,
    pub collateral_usd: String,
    pub suggested_collateral: String,
    pub can_borrow: bool,
    pub blockers: Vec<&'static str>,
}

pub fn quote(
    prices: &PerCurrency<BigInt>,
    balances: &BalanceRecord,
    body: &Body,
) -> Result<Response, Error> {
    let loan_amount = decimal_string_to_stroops(&body.loan_amount)?;

    let mut request = BorrowRequest {
        loan_ticker: body.loan_ticker,
        loan_amount,
        collateral_ticker: body.collateral_ticker,
        collateral_amount: BigInt::from(0),
    };

    let suggested = BorrowQuote::new(prices, request.clone(), balances)
        .suggested_collateral(prices, balances)?;

    request.collateral_amount = match &body.collateral_amount {
        Some(amount) => decimal_string_to_stroops(amount)?,
        None => suggested.clone(),
    };

    let quote = BorrowQuote::new(prices, request, balances);

    Ok(Response {
        health: quote.band.text(),
        health_bars: quote.band.bars(),
        loan_usd: format_cent_amount(&quote.loan_cents),
        collateral_usd: format_cent_amount(&quote.collateral_cents),
        suggested_collateral: stroops_to_decimal_string(&suggested),
        can_borrow: quote.can_borrow(),
        blockers: quote.blockers.iter().map(|blocker| blocker.message()).collect(),
        quote,
    })
}
