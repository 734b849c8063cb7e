use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::Serialize;

use crate::{error::Error, types::Pool_State_Type};

use super::{PerCurrency, Ticker};

/// Data fetched from the network that may not have arrived yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Loadable<T> {
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> Loadable<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            Loadable::Loading | Loadable::Error(_) => None,
        }
    }

    /// The loaded value or `Error::PoolNotLoaded` naming `what`.
    pub fn require(&self, what: &str) -> Result<&T, Error> {
        match self {
            Loadable::Loaded(value) => Ok(value),
            Loadable::Loading => Err(Error::PoolNotLoaded(format!("{} still loading", what))),
            Loadable::Error(err) => Err(Error::PoolNotLoaded(format!("{}: {}", what, err))),
        }
    }

    pub fn map<U, F>(&self, f: F) -> Loadable<U>
    where
        F: FnOnce(&T) -> U,
    {
        match self {
            Loadable::Loading => Loadable::Loading,
            Loadable::Loaded(value) => Loadable::Loaded(f(value)),
            Loadable::Error(err) => Loadable::Error(err.to_owned()),
        }
    }
}

impl<T> From<Result<T, Error>> for Loadable<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Loadable::Loaded(value),
            Err(err) => Loadable::Error(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolState {
    #[serde(with = "crate::types::big_int")]
    pub total_balance_tokens: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub available_balance_tokens: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub total_balance_shares: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub annual_interest_rate: BigInt,
}

impl PoolState {
    /// Tokens currently lent out to borrowers.
    pub fn borrowed_tokens(&self) -> BigInt {
        &self.total_balance_tokens - &self.available_balance_tokens
    }

    /// Tokens redeemable for `shares` at the current share price.
    pub fn shares_to_tokens(&self, shares: &BigInt) -> BigInt {
        if self.total_balance_shares.is_zero() {
            return BigInt::zero();
        }

        shares * &self.total_balance_tokens / &self.total_balance_shares
    }
}

impl From<Pool_State_Type> for PoolState {
    fn from(value: Pool_State_Type) -> Self {
        PoolState {
            total_balance_tokens: value.total_balance_tokens,
            available_balance_tokens: value.available_balance_tokens,
            total_balance_shares: value.total_balance_shares,
            annual_interest_rate: value.annual_interest_rate,
        }
    }
}

pub type PoolRecord = PerCurrency<Loadable<PoolState>>;

pub type PriceRecord = PerCurrency<Loadable<BigInt>>;

/// Latest view of every pool and oracle price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub pools: PoolRecord,
    pub prices: PriceRecord,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl PoolSnapshot {
    pub fn loading() -> Self {
        PoolSnapshot {
            pools: PerCurrency::from_fn(|_| Loadable::Loading),
            prices: PerCurrency::from_fn(|_| Loadable::Loading),
            fetched_at: None,
        }
    }

    pub fn pool(&self, ticker: Ticker) -> Result<&PoolState, Error> {
        self.pools.get(ticker).require(&format!("{} pool", ticker))
    }

    pub fn price(&self, ticker: Ticker) -> Result<&BigInt, Error> {
        self.prices.get(ticker).require(&format!("{} price", ticker))
    }

    /// All prices, or `None` while any of them is missing.
    pub fn loaded_prices(&self) -> Option<PerCurrency<BigInt>> {
        PerCurrency::try_from_fn(|ticker| self.prices.get(ticker).loaded().cloned().ok_or(()))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(total: i64, available: i64, shares: i64) -> PoolState {
        PoolState {
            total_balance_tokens: BigInt::from(total),
            available_balance_tokens: BigInt::from(available),
            total_balance_shares: BigInt::from(shares),
            annual_interest_rate: BigInt::from(200_000),
        }
    }

    #[test]
    fn test_shares_to_tokens() {
        let state = pool(1_100, 600, 1_000);
        assert_eq!(state.shares_to_tokens(&BigInt::from(500)), BigInt::from(550));
        assert_eq!(state.borrowed_tokens(), BigInt::from(500));
    }

    #[test]
    fn test_shares_to_tokens_empty_pool() {
        let state = pool(0, 0, 0);
        assert_eq!(state.shares_to_tokens(&BigInt::from(500)), BigInt::zero());
    }

    #[test]
    fn test_loadable_require() {
        let loading: Loadable<i32> = Loadable::Loading;
        assert!(matches!(loading.require("x"), Err(Error::PoolNotLoaded(_))));

        let loaded = Loadable::Loaded(3);
        assert_eq!(*loaded.require("x").unwrap(), 3);

        let failed: Loadable<i32> = Err(Error::ZeroPrice).into();
        assert!(matches!(failed, Loadable::Error(_)));
    }

    #[test]
    fn test_loaded_prices_requires_every_ticker() {
        let mut snapshot = PoolSnapshot::loading();
        assert!(snapshot.loaded_prices().is_none());

        snapshot.prices = PerCurrency::from_fn(|_| Loadable::Loaded(BigInt::from(1)));
        assert!(snapshot.loaded_prices().is_some());

        *snapshot.prices.get_mut(Ticker::Eurc) = Loadable::Error(String::from("oracle"));
        assert!(snapshot.loaded_prices().is_none());
    }

    #[test]
    fn test_loadable_serializes_with_status() {
        let value: Loadable<u8> = Loadable::Loaded(1);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["status"], "loaded");
        assert_eq!(json["data"], 1);
    }
}
