use num_bigint::BigInt;
use serde::Deserialize;

/// `get_loan` result of the loan manager contract.
#[derive(Debug, Deserialize, Clone)]
pub struct Loan_Type {
    pub borrower: String,
    #[serde(with = "super::big_int")]
    pub borrowed_amount: BigInt,
    pub borrowed_from: String,
    #[serde(with = "super::big_int")]
    pub collateral_amount: BigInt,
    pub collateral_from: String,
    #[serde(with = "super::big_int")]
    pub health_factor: BigInt,
    #[serde(with = "super::big_int")]
    pub unpaid_interest: BigInt,
}
