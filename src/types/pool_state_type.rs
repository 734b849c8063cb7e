use num_bigint::BigInt;
use serde::Deserialize;

/// `get_pool_state` result of a loan pool contract.
#[derive(Debug, Deserialize, Clone)]
pub struct Pool_State_Type {
    #[serde(with = "super::big_int")]
    pub total_balance_tokens: BigInt,
    #[serde(with = "super::big_int")]
    pub available_balance_tokens: BigInt,
    #[serde(with = "super::big_int")]
    pub total_balance_shares: BigInt,
    #[serde(with = "super::big_int")]
    pub annual_interest_rate: BigInt,
}
