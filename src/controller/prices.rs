use actix_web::{get, web, Responder};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::Serialize;

use crate::{
    configuration::{AppState, State},
    error::Error,
    helpers::{converters::scalar_7, formatting::to_dollars_formatted},
    model::{Loadable, PerCurrency},
};

#[get("/prices")]
async fn index(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let snapshot = state.pools.snapshot();
    let prices = snapshot.prices.map(|_, price| price.map(Price::new));

    Ok(web::Json(Response {
        fetched_at: snapshot.fetched_at,
        prices,
    }))
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub fetched_at: Option<DateTime<Utc>>,
    pub prices: PerCurrency<Loadable<Price>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Price {
    #[serde(with = "crate::types::big_int")]
    pub price: BigInt,
    /// Dollar value of one whole token.
    pub usd: String,
}

impl Price {
    pub fn new(price: &BigInt) -> Self {
        Price {
            price: price.clone(),
            usd: to_dollars_formatted(price, &scalar_7()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_of_one_token() {
        let price = Price::new(&BigInt::from(10_000_000_000_000_i64));
        assert_eq!(price.usd, "$0.10");

        let json = serde_json::to_value(&price).unwrap();
        assert_eq!(json["price"], "10000000000000");
    }
}
