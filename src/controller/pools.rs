use actix_web::{get, web, Responder};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::Serialize;

use crate::{
    bindings::CurrencyBindings,
    configuration::{AppState, State},
    error::Error,
    helpers::formatting::{
        format_amount, format_apr, format_apy, to_dollars_formatted,
    },
    model::{Loadable, PoolSnapshot, PoolState, Ticker},
    provider::Invoker,
};

#[get("/pools")]
async fn index(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let snapshot = state.pools.snapshot();

    Ok(web::Json(response(&state.bindings, &snapshot)))
}

pub fn response<I: Invoker>(bindings: &CurrencyBindings<I>, snapshot: &PoolSnapshot) -> Response {
    let pools = Ticker::ALL
        .into_iter()
        .map(|ticker| {
            let binding = bindings.get(ticker);
            let price = snapshot.prices.get(ticker).loaded();

            Pool {
                ticker,
                name: binding.currency.name,
                icon: binding.icon,
                contract_id: binding.contract_id.to_owned(),
                state: snapshot
                    .pools
                    .get(ticker)
                    .map(|pool| PoolView::new(pool, price)),
            }
        })
        .collect::<Vec<Pool>>();

    Response {
        fetched_at: snapshot.fetched_at,
        pools,
    }
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub fetched_at: Option<DateTime<Utc>>,
    pub pools: Vec<Pool>,
}

#[derive(Debug, Serialize)]
pub struct Pool {
    pub ticker: Ticker,
    pub name: &'static str,
    pub icon: &'static str,
    pub contract_id: String,
    pub state: Loadable<PoolView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolView {
    pub total_supplied: String,
    pub total_borrowed: String,
    pub available: String,
    pub apr: String,
    pub apy: String,
    pub total_supplied_usd: Option<String>,
    pub total_borrowed_usd: Option<String>,
}

impl PoolView {
    pub fn new(pool: &PoolState, price: Option<&BigInt>) -> Self {
        let borrowed = pool.borrowed_tokens();
        let dollars =
            |amount: &BigInt| price.map(|price| to_dollars_formatted(price, amount));

        PoolView {
            total_supplied: format_amount(&pool.total_balance_tokens),
            total_borrowed: format_amount(&borrowed),
            available: format_amount(&pool.available_balance_tokens),
            apr: format_apr(&pool.annual_interest_rate),
            apy: format_apy(&pool.annual_interest_rate),
            total_supplied_usd: dollars(&pool.total_balance_tokens),
            total_borrowed_usd: dollars(&borrowed),
        }
    }
}
