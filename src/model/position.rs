use num_bigint::BigInt;
use num_traits::Zero;
use serde::Serialize;

use crate::types::Positions_Type;

use super::{pool::PoolState, Ticker};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Positions {
    #[serde(with = "crate::types::big_int")]
    pub receivable_shares: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub liabilities: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub collateral: BigInt,
}

impl Positions {
    pub fn is_empty(&self) -> bool {
        self.receivable_shares.is_zero()
            && self.liabilities.is_zero()
            && self.collateral.is_zero()
    }

    /// Tokens the deposit can be withdrawn as right now.
    pub fn withdrawable(&self, pool: &PoolState) -> BigInt {
        pool.shares_to_tokens(&self.receivable_shares)
    }
}

impl From<Positions_Type> for Positions {
    fn from(value: Positions_Type) -> Self {
        Positions {
            receivable_shares: value.receivables,
            liabilities: value.liabilities,
            collateral: value.collateral,
        }
    }
}

/// Percent added on top of the outstanding balance when closing a loan,
/// interest keeps accruing between signing and inclusion.
pub const REPAY_ALL_ALLOWANCE_PERCENT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loan {
    pub borrower: String,
    #[serde(with = "crate::types::big_int")]
    pub borrowed_amount: BigInt,
    pub borrowed_ticker: Ticker,
    #[serde(with = "crate::types::big_int")]
    pub collateral_amount: BigInt,
    pub collateral_ticker: Ticker,
    #[serde(with = "crate::types::big_int")]
    pub health_factor: BigInt,
    #[serde(with = "crate::types::big_int")]
    pub unpaid_interest: BigInt,
}

impl Loan {
    /// Principal plus accrued interest.
    pub fn balance(&self) -> BigInt {
        &self.borrowed_amount + &self.unpaid_interest
    }

    pub fn repay_all_allowance(&self) -> BigInt {
        let balance = self.balance();
        &balance * REPAY_ALL_ALLOWANCE_PERCENT / 100 + &balance
    }
}
