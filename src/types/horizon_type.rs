use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Account_Type {
    pub id: String,
    pub balances: Vec<Balance_Line_Type>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Balance_Line_Type {
    pub balance: String,
    pub asset_type: String,
    pub asset_code: Option<String>,
    pub asset_issuer: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Submit_Transaction_Type {
    pub hash: String,
    pub successful: Option<bool>,
    pub ledger: Option<i64>,
}

/// Problem document returned by Horizon on failures.
#[derive(Debug, Deserialize, Clone)]
pub struct Horizon_Problem_Type {
    pub title: String,
    pub status: u16,
    pub detail: Option<String>,
    pub extras: Option<serde_json::Value>,
}
