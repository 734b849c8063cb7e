use num_bigint::BigInt;
use serde::Deserialize;

/// Single `i128` returned by a contract call.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Amount_Type(#[serde(with = "super::big_int")] pub BigInt);

/// `(i128, i128)` tuple, e.g. `withdraw` returns `(burned_shares, amount)`
/// and `repay` returns `(borrowed_amount, unpaid_interest)` left over.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Amount_Pair_Type(
    #[serde(with = "super::big_int")] pub BigInt,
    #[serde(with = "super::big_int")] pub BigInt,
);
