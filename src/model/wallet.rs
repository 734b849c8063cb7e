use num_bigint::BigInt;
use num_traits::Zero;
use serde::Serialize;

use crate::{
    error::Error, helpers::converters::decimal_string_to_stroops,
    types::Balance_Line_Type,
};

use super::{PerCurrency, Ticker};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wallet {
    pub name: String,
    pub address: String,
    pub display_name: String,
}

impl Wallet {
    pub fn new(name: &str, address: &str) -> Self {
        Wallet {
            name: name.to_owned(),
            address: address.to_owned(),
            display_name: display_name(address),
        }
    }
}

/// `GABCD...WXYZ` style shortening of an account address.
pub fn display_name(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_owned();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "trustline", rename_all = "snake_case")]
pub enum Balance {
    NoTrustline,
    Trustline {
        #[serde(with = "crate::types::big_int")]
        balance: BigInt,
    },
}

impl Balance {
    pub fn has_trustline(&self) -> bool {
        matches!(self, Balance::Trustline { .. })
    }

    /// Stroops held, zero without a trustline.
    pub fn amount(&self) -> BigInt {
        match self {
            Balance::Trustline { balance } => balance.clone(),
            Balance::NoTrustline => BigInt::zero(),
        }
    }
}

pub type BalanceRecord = PerCurrency<Balance>;

/// Picks the supported assets out of a Horizon balance list. Credit assets
/// only count when both code and issuer match.
pub fn create_balance_record(
    balances: &[Balance_Line_Type],
) -> Result<BalanceRecord, Error> {
    let mut record = PerCurrency::from_fn(|_| Balance::NoTrustline);

    for line in balances {
        let ticker = match line.asset_type.as_str() {
            "native" => Some(Ticker::Xlm),
            "credit_alphanum4" => supported_ticker(line),
            _ => None,
        };

        if let Some(ticker) = ticker {
            let balance = decimal_string_to_stroops(&line.balance)?;
            *record.get_mut(ticker) = Balance::Trustline { balance };
        }
    }

    Ok(record)
}

fn supported_ticker(line: &Balance_Line_Type) -> Option<Ticker> {
    let code = line.asset_code.as_deref()?;
    let issuer = line.asset_issuer.as_deref()?;

    Ticker::ALL.into_iter().find(|ticker| {
        let currency = ticker.currency();
        currency.ticker.as_str() == code && currency.issuer == Some(issuer)
    })
}
