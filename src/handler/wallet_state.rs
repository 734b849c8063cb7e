use serde::Serialize;
use tracing::warn;

use futures::join;

use crate::{
    bindings::CurrencyBindings,
    configuration::State,
    error::Error,
    model::{
        create_balance_record, BalanceRecord, PerCurrency, Positions, Ticker,
    },
    provider::{Horizon, Invoker},
};

/// Balances and pool positions of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletState {
    pub address: String,
    pub balances: BalanceRecord,
    pub positions: PerCurrency<Option<Positions>>,
}

/// Positions in every pool. A pool that fails to answer is left out.
pub async fn fetch_positions<I: Invoker>(
    bindings: &CurrencyBindings<I>,
    address: &str,
) -> PerCurrency<Option<Positions>> {
    let fetch = |ticker: Ticker| async move {
        match bindings.get(ticker).client.get_user_positions(address).await {
            Ok(positions) => Some(positions),
            Err(err) => {
                warn!("No {} positions for {}: {}", ticker, address, err);
                None
            },
        }
    };

    let (xlm, usdc, eurc) = join!(
        fetch(Ticker::Xlm),
        fetch(Ticker::Usdc),
        fetch(Ticker::Eurc)
    );

    PerCurrency { xlm, usdc, eurc }
}

pub async fn fetch_wallet_state<I: Invoker>(
    horizon: &Horizon,
    bindings: &CurrencyBindings<I>,
    address: &str,
) -> Result<WalletState, Error> {
    let (balances, positions) = join!(
        horizon.get_balances(address),
        fetch_positions(bindings, address)
    );
    let balances = create_balance_record(&balances?)?;

    Ok(WalletState {
        address: address.to_owned(),
        balances,
        positions,
    })
}

/// Refreshes what a sent transaction changed: the cached wallet of
/// `address` is dropped, the pool snapshot is fetched again and the fresh
/// positions are returned.
pub async fn refresh_after_transaction<I: Invoker + 'static>(
    state: &State<I>,
    address: &str,
) -> PerCurrency<Option<Positions>> {
    state.wallet_cache.invalidate(&address.to_owned()).await;

    let (_, positions) = join!(
        state.pools.refetch(),
        fetch_positions(&state.bindings, address)
    );

    positions
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use num_bigint::BigInt;

    use super::*;
    use crate::{bindings::fixtures, provider::shell::mock::MockInvoker};

    #[tokio::test]
    async fn test_fetch_positions_skips_failures() {
        let invoker = Arc::new(MockInvoker::new());
        invoker
            .push_output(r#"{"receivables":"300","liabilities":"0","collateral":"0"}"#)
            .push_failure("contract error")
            .push_output(r#"{"receivable_shares":"5","liabilities":"1","collateral":"2"}"#);

        let positions = fetch_positions(&fixtures::bindings(&invoker), "GUSER").await;

        let present = [&positions.xlm, &positions.usdc, &positions.eurc]
            .iter()
            .filter(|item| item.is_some())
            .count();
        assert_eq!(present, 2);

        for command in invoker.commands() {
            assert_eq!(command.flag_value("user"), Some("GUSER"));
        }
    }

    #[tokio::test]
    async fn test_fetch_positions_parses_shares() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.on_arg(
            "get_user_positions",
            r#"{"receivables":"300","liabilities":"0","collateral":"7"}"#,
        );

        let positions = fetch_positions(&fixtures::bindings(&invoker), "GUSER").await;
        let usdc = positions.usdc.unwrap();

        assert_eq!(usdc.receivable_shares, BigInt::from(300));
        assert_eq!(usdc.collateral, BigInt::from(7));
    }

    #[tokio::test]
    async fn test_deposit_is_followed_by_refresh() {
        let invoker = Arc::new(MockInvoker::new());
        let state = State::new(crate::configuration::fixtures::config(), invoker.clone())
            .unwrap();
        let address = String::from("GUSER");

        let stale = WalletState {
            address: address.clone(),
            balances: PerCurrency::from_fn(|_| crate::model::Balance::NoTrustline),
            positions: PerCurrency::from_fn(|_| None),
        };
        state.wallet_cache.set(address.clone(), stale).await;

        invoker
            .push_output("\"25000000\"")
            .push_output("BUILT")
            .push_output("ASSEMBLED")
            .push_output("{}")
            .on_arg(
                "get_pool_state",
                r#"{"annual_interest_rate":"200000","available_balance_tokens":"600","total_balance_shares":"1000","total_balance_tokens":"1100"}"#,
            )
            .on_arg("get_price", "\"1\"")
            .on_arg(
                "get_user_positions",
                r#"{"receivables":"25000000","liabilities":"0","collateral":"0"}"#,
            );

        crate::flow::deposit(
            state.bindings.get(Ticker::Usdc),
            &crate::provider::wallet::mock::MockWallet::new(&address),
            &BigInt::from(25_000_000),
            &crate::model::Balance::Trustline {
                balance: BigInt::from(100_000_000),
            },
        )
        .await
        .unwrap();
        assert_eq!(invoker.commands().len(), 4);

        let positions = refresh_after_transaction(&state, &address).await;

        assert_eq!(
            positions.usdc.unwrap().receivable_shares,
            BigInt::from(25_000_000)
        );
        assert_eq!(state.wallet_cache.get(&address).await, None);
        assert!(state.pools.snapshot().pool(Ticker::Usdc).is_ok());

        let reads = invoker.commands()[4..]
            .iter()
            .filter(|command| command.has_arg("get_pool_state"))
            .count();
        assert_eq!(reads, 3);
        assert_eq!(invoker.commands().len(), 4 + 6 + 3);
    }
}
