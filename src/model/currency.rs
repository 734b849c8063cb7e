use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Ticker {
    #[serde(rename = "XLM")]
    Xlm,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "EURC")]
    Eurc,
}

impl Ticker {
    pub const ALL: [Ticker; 3] = [Ticker::Xlm, Ticker::Usdc, Ticker::Eurc];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Ticker::Xlm => "XLM",
            Ticker::Usdc => "USDC",
            Ticker::Eurc => "EURC",
        }
    }

    pub const fn currency(&self) -> &'static Currency {
        match self {
            Ticker::Xlm => &CURRENCY_XLM,
            Ticker::Usdc => &CURRENCY_USDC,
            Ticker::Eurc => &CURRENCY_EURC,
        }
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ticker {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_uppercase().as_str() {
            "XLM" => Ok(Ticker::Xlm),
            "USDC" => Ok(Ticker::Usdc),
            "EURC" => Ok(Ticker::Eurc),
            _ => Err(Error::NotSupportedCurrency(value.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub name: &'static str,
    pub ticker: Ticker,
    pub issuer_name: &'static str,
    pub token_contract_address: &'static str,
    pub loan_pool_name: &'static str,
    pub issuer: Option<&'static str>,
    pub icon: &'static str,
}

// Testnet deployments of the token contracts and their classic issuers.
pub const CURRENCY_XLM: Currency = Currency {
    name: "Stellar Lumens",
    ticker: Ticker::Xlm,
    issuer_name: "native",
    token_contract_address: "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC",
    loan_pool_name: "pool_xlm",
    issuer: None,
    icon: "/images/xlm.svg",
};

pub const CURRENCY_USDC: Currency = Currency {
    name: "USD Coin",
    ticker: Ticker::Usdc,
    issuer_name: "centre.io",
    token_contract_address: "CAHMBFPE4BNP26VUFRYBJ43GWENCAS2JAGQ7VPBV23CUFL4ZWZQGNBGO",
    loan_pool_name: "pool_usdc",
    issuer: Some("GBE3CPBXTOGG75G7GETO5QZBYB4WCDTX6XWUEVZMXFP6Q66OR4MSLIPU"),
    icon: "/images/usdc.svg",
};

pub const CURRENCY_EURC: Currency = Currency {
    name: "Euro Coin",
    ticker: Ticker::Eurc,
    issuer_name: "centre.io",
    token_contract_address: "CDR3UKQ3L5K2JV2OINPVLB6NIOLSROAKMWPEML4CMXBN5NBAUGWFBNYZ",
    loan_pool_name: "pool_eurc",
    issuer: Some("GBE3CPBXTOGG75G7GETO5QZBYB4WCDTX6XWUEVZMXFP6Q66OR4MSLIPU"),
    icon: "/images/eurc.svg",
};

impl Currency {
    pub fn is_native(&self) -> bool {
        self.issuer.is_none()
    }

    /// `CODE:ISSUER` as the stellar CLI expects for trustlines.
    pub fn asset_line(&self) -> Result<String, Error> {
        match self.issuer {
            Some(issuer) => Ok(format!("{}:{}", self.ticker, issuer)),
            None => Err(Error::ActionNotAllowed(format!(
                "{} is native and needs no trustline",
                self.ticker
            ))),
        }
    }
}

/// One value per supported currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCurrency<T> {
    #[serde(rename = "XLM")]
    pub xlm: T,
    #[serde(rename = "USDC")]
    pub usdc: T,
    #[serde(rename = "EURC")]
    pub eurc: T,
}

impl<T> PerCurrency<T> {
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(Ticker) -> T,
    {
        PerCurrency {
            xlm: f(Ticker::Xlm),
            usdc: f(Ticker::Usdc),
            eurc: f(Ticker::Eurc),
        }
    }

    pub fn try_from_fn<F, E>(mut f: F) -> Result<Self, E>
    where
        F: FnMut(Ticker) -> Result<T, E>,
    {
        Ok(PerCurrency {
            xlm: f(Ticker::Xlm)?,
            usdc: f(Ticker::Usdc)?,
            eurc: f(Ticker::Eurc)?,
        })
    }

    pub fn get(&self, ticker: Ticker) -> &T {
        match ticker {
            Ticker::Xlm => &self.xlm,
            Ticker::Usdc => &self.usdc,
            Ticker::Eurc => &self.eurc,
        }
    }

    pub fn get_mut(&mut self, ticker: Ticker) -> &mut T {
        match ticker {
            Ticker::Xlm => &mut self.xlm,
            Ticker::Usdc => &mut self.usdc,
            Ticker::Eurc => &mut self.eurc,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ticker, &T)> {
        Ticker::ALL.into_iter().map(move |ticker| (ticker, self.get(ticker)))
    }

    pub fn map<U, F>(&self, mut f: F) -> PerCurrency<U>
    where
        F: FnMut(Ticker, &T) -> U,
    {
        PerCurrency::from_fn(|ticker| f(ticker, self.get(ticker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_parse() {
        assert_eq!(Ticker::from_str("xlm").unwrap(), Ticker::Xlm);
        assert_eq!(Ticker::from_str("USDC").unwrap(), Ticker::Usdc);
        assert!(matches!(
            Ticker::from_str("BTC"),
            Err(Error::NotSupportedCurrency(_))
        ));
    }

    #[test]
    fn test_currency_metadata_matches_ticker() {
        for ticker in Ticker::ALL {
            assert_eq!(ticker.currency().ticker, ticker);
        }
        assert!(CURRENCY_XLM.is_native());
        assert!(CURRENCY_XLM.asset_line().is_err());
        assert_eq!(
            CURRENCY_EURC.asset_line().unwrap(),
            "EURC:GBE3CPBXTOGG75G7GETO5QZBYB4WCDTX6XWUEVZMXFP6Q66OR4MSLIPU"
        );
    }

    #[test]
    fn test_per_currency_serializes_by_ticker() {
        let record = PerCurrency::from_fn(|ticker| ticker.as_str().len());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["USDC"], 4);
        assert_eq!(*record.get(Ticker::Xlm), 3);
    }
}
