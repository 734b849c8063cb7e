use num_bigint::BigInt;
use serde::Deserialize;

/// `get_user_positions` result of a loan pool contract.
#[derive(Debug, Deserialize, Clone)]
pub struct Positions_Type {
    #[serde(with = "super::big_int", alias = "receivable_shares")]
    pub receivables: BigInt,
    #[serde(with = "super::big_int")]
    pub liabilities: BigInt,
    #[serde(with = "super::big_int")]
    pub collateral: BigInt,
}
