//! Domain model shared by the providers, flows and the HTTP layer.

pub use self::{
    currency::{
        Currency, PerCurrency, Ticker, CURRENCY_EURC, CURRENCY_USDC,
        CURRENCY_XLM,
    },
    pool::{Loadable, PoolRecord, PoolSnapshot, PoolState, PriceRecord},
    position::{Loan, Positions, REPAY_ALL_ALLOWANCE_PERCENT},
    wallet::{
        create_balance_record, display_name, Balance, BalanceRecord, Wallet,
    },
};

pub mod currency;
pub mod pool;
pub mod position;
pub mod wallet;
