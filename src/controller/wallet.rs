use actix_web::{get, web, Responder};
use serde::Serialize;

use crate::{
    configuration::{AppState, State},
    error::Error,
    handler::wallet_state::{fetch_wallet_state, WalletState},
    helpers::formatting::format_amount,
    model::{display_name, PerCurrency, PoolSnapshot},
};

#[get("/wallet/{address}")]
async fn index(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    let address = path.into_inner();
    let wallet = state
        .wallet_cache
        .get_or_fetch(&address, || {
            fetch_wallet_state(&state.horizon, &state.bindings, &address)
        })
        .await?;

    let withdrawable = withdrawable(&wallet, &state.pools.snapshot());

    Ok(web::Json(Response {
        display_name: display_name(&address),
        wallet,
        withdrawable,
    }))
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub display_name: String,
    #[serde(flatten)]
    pub wallet: WalletState,
    pub withdrawable: PerCurrency<Option<String>>,
}

/// Formatted amount each pool deposit can be withdrawn as, when both the
/// position and the pool are known.
fn withdrawable(
    wallet: &WalletState,
    snapshot: &PoolSnapshot,
) -> PerCurrency<Option<String>> {
    wallet.positions.map(|ticker, positions| {
        let positions = positions.as_ref()?;
        let pool = snapshot.pools.get(ticker).loaded()?;
        Some(format_amount(&positions.withdrawable(pool)))
    })
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;
    use crate::model::{Balance, Loadable, PoolState, Positions};

    #[test]
    fn test_withdrawable_needs_pool_and_position() {
        let wallet = WalletState {
            address: String::from("GUSER"),
            balances: PerCurrency::from_fn(|_| Balance::NoTrustline),
            positions: PerCurrency {
                xlm: Some(Positions {
                    receivable_shares: BigInt::from(500_000_000),
                    ..Default::default()
                }),
                usdc: Some(Positions::default()),
                eurc: None,
            },
        };

        let mut snapshot = PoolSnapshot::loading();
        snapshot.pools.xlm = Loadable::Loaded(PoolState {
            total_balance_tokens: BigInt::from(2_000_000_000_i64),
            available_balance_tokens: BigInt::from(0),
            total_balance_shares: BigInt::from(1_000_000_000),
            annual_interest_rate: BigInt::from(0),
        });

        let result = withdrawable(&wallet, &snapshot);
        assert_eq!(result.xlm.as_deref(), Some("100.0"));
        assert_eq!(result.usdc, None);
        assert_eq!(result.eurc, None);
    }
}
