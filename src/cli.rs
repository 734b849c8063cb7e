//! Command line for the Laina client.
//!
//! Reads pool and wallet state, runs lending actions signed by a keystore
//! identity and deploys the contracts, without starting the HTTP server.

use std::{future::Future, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::{
    configuration::{
        get_configuration, set_configuration, set_configuration_from, Config,
        State, CONFIG_FILES,
    },
    controller::{borrow_quote, loans::LoanView, pools},
    deploy::{self, Deployer},
    error::Error,
    flow::{self, ActionFlow, BorrowFlow, BorrowStage, FlowState},
    handler::{
        loans::{fetch_loan, fetch_loans},
        wallet_state::{fetch_wallet_state, refresh_after_transaction, WalletState},
    },
    helpers::converters::decimal_string_to_stroops,
    model::{create_balance_record, BalanceRecord, PerCurrency, Positions, Ticker},
    provider::{KeyWallet, Shell, Signer},
};

/// Contract builds and uploads run far longer than a simulation.
const DEPLOY_TIMEOUT: u64 = 900;

/// Laina lending protocol
#[derive(Parser)]
#[command(name = "laina")]
#[command(about = "Laina lending protocol client and API server", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server (default if no command specified)
    Serve,

    /// Print the state of every pool
    Pools,

    /// Print balances, positions and loans of an account
    Wallet {
        /// Account to inspect, defaults to SOROBAN_ACCOUNT
        #[arg(long)]
        address: Option<String>,
    },

    /// Quote a loan without sending it
    Quote {
        #[arg(long, value_parser = parse_ticker)]
        loan: Ticker,

        /// Loan amount in whole tokens, e.g. 12.5
        #[arg(long)]
        amount: String,

        #[arg(long, value_parser = parse_ticker)]
        collateral: Ticker,

        /// Collateral amount, the suggested collateral when omitted
        #[arg(long)]
        collateral_amount: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Lend tokens to a pool
    Deposit {
        #[arg(long, value_parser = parse_ticker)]
        ticker: Ticker,

        #[arg(long)]
        amount: String,
    },

    /// Withdraw lent tokens from a pool
    Withdraw {
        #[arg(long, value_parser = parse_ticker)]
        ticker: Ticker,

        #[arg(long)]
        amount: String,
    },

    /// Open a loan, adding the trustline first when needed
    Borrow {
        #[arg(long, value_parser = parse_ticker)]
        loan: Ticker,

        #[arg(long)]
        amount: String,

        #[arg(long, value_parser = parse_ticker)]
        collateral: Ticker,

        #[arg(long)]
        collateral_amount: Option<String>,
    },

    /// Repay part of the open loan
    Repay {
        #[arg(long)]
        amount: String,
    },

    /// Repay the whole loan and get the collateral back
    RepayAll,

    /// Add a trustline so the account can hold a token
    Trustline {
        #[arg(long, value_parser = parse_ticker)]
        ticker: Ticker,
    },

    /// Deploy or upgrade the contracts
    Deploy {
        #[command(subcommand)]
        command: DeployCommands,
    },
}

#[derive(Subcommand)]
pub enum DeployCommands {
    /// Fund the account, deploy the loan manager and one pool per currency
    Init,

    /// Install new wasm and upgrade the deployed contracts
    Upgrade,

    /// Rewrite contracts.conf from the stored contract ids
    Glue,
}

fn parse_ticker(value: &str) -> Result<Ticker, String> {
    value.parse::<Ticker>().map_err(|err| err.to_string())
}

/// Initialize configuration and return Config
pub fn init_config() -> Result<Config, Error> {
    set_configuration()?;
    get_configuration()
}

pub async fn run(command: Commands) -> Result<(), Error> {
    match command {
        Commands::Serve => Err(Error::ConfigurationError(String::from(
            "serve is started by the binary",
        ))),
        Commands::Pools => run_pools().await,
        Commands::Wallet { address } => run_wallet(address).await,
        Commands::Quote {
            loan,
            amount,
            collateral,
            collateral_amount,
            address,
        } => {
            let body = borrow_quote::Body {
                address: address.unwrap_or_default(),
                loan_ticker: loan,
                loan_amount: amount,
                collateral_ticker: collateral,
                collateral_amount,
            };
            run_quote(body).await
        },
        Commands::Deposit { ticker, amount } => run_deposit(ticker, &amount).await,
        Commands::Withdraw { ticker, amount } => {
            run_withdraw(ticker, &amount).await
        },
        Commands::Borrow {
            loan,
            amount,
            collateral,
            collateral_amount,
        } => {
            let body = borrow_quote::Body {
                address: String::new(),
                loan_ticker: loan,
                loan_amount: amount,
                collateral_ticker: collateral,
                collateral_amount,
            };
            run_borrow(body).await
        },
        Commands::Repay { amount } => run_repay(Some(&amount)).await,
        Commands::RepayAll => run_repay(None).await,
        Commands::Trustline { ticker } => run_trustline(ticker).await,
        Commands::Deploy { command } => run_deploy(command).await,
    }
}

fn init_state() -> Result<State, Error> {
    let config = init_config()?;
    let invoker = Arc::new(Shell::new(config.timeout));
    State::new(config, invoker)
}

async fn key_wallet(state: &State) -> Result<KeyWallet<Shell>, Error> {
    let alias = state.config.account()?;
    KeyWallet::load(state.invoker.clone(), state.cli.clone(), alias).await
}

async fn balances(state: &State, address: &str) -> Result<BalanceRecord, Error> {
    let balances = state.horizon.get_balances(address).await?;
    create_balance_record(&balances)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Success prints the message, a failed action becomes the exit error.
fn report(state: &FlowState<String>) -> Result<(), Error> {
    match state {
        FlowState::Success(message) => {
            println!("{}", message);
            Ok(())
        },
        FlowState::Failed(message) => Err(Error::ActionFailed(message.to_owned())),
        FlowState::Idle | FlowState::Submitting => Ok(()),
    }
}

#[derive(Serialize)]
struct AccountReport {
    positions: PerCurrency<Option<Positions>>,
    loans: Vec<LoanView>,
}

/// Prints the positions and loans of `address` as they are after a
/// transaction.
async fn print_refreshed(state: &State, address: &str) -> Result<(), Error> {
    let positions = refresh_after_transaction(state, address).await;
    let prices = state.pools.snapshot().loaded_prices();
    let loans = fetch_loans(&state.manager, &state.bindings, address)
        .await
        .iter()
        .map(|loan| LoanView::new(loan, prices.as_ref()))
        .collect();

    print_json(&AccountReport { positions, loans })
}

async fn run_action<F>(state: &State, address: &str, action: F) -> Result<(), Error>
where
    F: Future<Output = Result<String, Error>>,
{
    let mut flow = ActionFlow::new();
    report(flow.run(action).await?)?;

    print_refreshed(state, address).await
}

async fn run_pools() -> Result<(), Error> {
    let state = init_state()?;
    let snapshot = state.pools.refetch().await;

    print_json(&pools::response(&state.bindings, &snapshot))
}

#[derive(Serialize)]
struct WalletReport {
    #[serde(flatten)]
    wallet: WalletState,
    loans: Vec<LoanView>,
}

async fn run_wallet(address: Option<String>) -> Result<(), Error> {
    let state = init_state()?;
    let address = match address {
        Some(address) => address,
        None => key_wallet(&state).await?.address().to_owned(),
    };

    let prices = state.pools.refetch().await.loaded_prices();
    let wallet = fetch_wallet_state(&state.horizon, &state.bindings, &address).await?;
    let loans = fetch_loans(&state.manager, &state.bindings, &address)
        .await
        .iter()
        .map(|loan| LoanView::new(loan, prices.as_ref()))
        .collect();

    print_json(&WalletReport { wallet, loans })
}

async fn run_quote(mut body: borrow_quote::Body) -> Result<(), Error> {
    let state = init_state()?;
    if body.address.is_empty() {
        body.address = key_wallet(&state).await?.address().to_owned();
    }

    let prices = state.pools.refetch().await.loaded_prices().ok_or_else(|| {
        Error::PoolNotLoaded(String::from("prices could not be fetched"))
    })?;
    let balances = balances(&state, &body.address).await?;

    print_json(&borrow_quote::quote(&prices, &balances, &body)?)
}

async fn run_deposit(ticker: Ticker, amount: &str) -> Result<(), Error> {
    let amount = decimal_string_to_stroops(amount)?;
    let state = init_state()?;
    let wallet = key_wallet(&state).await?;
    let balances = balances(&state, wallet.address()).await?;

    run_action(&state, wallet.address(), flow::deposit(
        state.bindings.get(ticker),
        &wallet,
        &amount,
        balances.get(ticker),
    ))
    .await
}

async fn run_withdraw(ticker: Ticker, amount: &str) -> Result<(), Error> {
    let amount = decimal_string_to_stroops(amount)?;
    let state = init_state()?;
    let wallet = key_wallet(&state).await?;
    let binding = state.bindings.get(ticker);

    let positions = binding.client.get_user_positions(wallet.address()).await?;
    let pool = binding.client.get_pool_state().await?;

    let action = flow::withdraw(binding, &wallet, &amount, &positions, &pool);
    run_action(&state, wallet.address(), action).await
}

async fn run_borrow(mut body: borrow_quote::Body) -> Result<(), Error> {
    let state = init_state()?;
    let wallet = key_wallet(&state).await?;
    body.address = wallet.address().to_owned();

    let prices = state.pools.refetch().await.loaded_prices().ok_or_else(|| {
        Error::PoolNotLoaded(String::from("prices could not be fetched"))
    })?;

    let mut balances = balances(&state, wallet.address()).await?;
    let loan_balance = balances.get(body.loan_ticker);
    let mut borrow_flow = BorrowFlow::new(loan_balance.has_trustline());

    if borrow_flow.stage() == BorrowStage::Trustline {
        info!("No {} trustline yet, adding it first", body.loan_ticker);

        let trustline = flow::add_trustline(
            &state.cli,
            state.invoker.as_ref(),
            &state.horizon,
            &wallet,
            body.loan_ticker.currency(),
            loan_balance,
        );
        report(borrow_flow.flow.run(trustline).await?)?;
        borrow_flow.continue_to_borrow()?;

        balances = self::balances(&state, wallet.address()).await?;
    }

    let response = borrow_quote::quote(&prices, &balances, &body)?;
    let action = flow::borrow(&state.manager, &state.bindings, &wallet, &response.quote);

    report(borrow_flow.flow.run(action).await?)?;

    print_refreshed(&state, wallet.address()).await
}

async fn run_repay(amount: Option<&str>) -> Result<(), Error> {
    let amount = amount.map(decimal_string_to_stroops).transpose()?;
    let state = init_state()?;
    let wallet = key_wallet(&state).await?;
    let loan = fetch_loan(&state.manager, &state.bindings, wallet.address()).await?;

    let address = wallet.address();
    match amount {
        Some(amount) => {
            let action = flow::repay(&state.manager, &wallet, &loan, &amount);
            run_action(&state, address, action).await
        },
        None => {
            let action = flow::repay_all(&state.manager, &wallet, &loan);
            run_action(&state, address, action).await
        },
    }
}

async fn run_trustline(ticker: Ticker) -> Result<(), Error> {
    let state = init_state()?;
    let wallet = key_wallet(&state).await?;
    let balances = balances(&state, wallet.address()).await?;

    run_action(&state, wallet.address(), flow::add_trustline(
        &state.cli,
        state.invoker.as_ref(),
        &state.horizon,
        &wallet,
        ticker.currency(),
        balances.get(ticker),
    ))
    .await
}

fn deployer(config: &Config) -> Result<Deployer<Shell>, Error> {
    Ok(Deployer {
        invoker: Arc::new(Shell::new(config.timeout.max(DEPLOY_TIMEOUT))),
        cli: config.stellar_cli(),
        network: config.network,
        account: config.account()?.to_owned(),
        contracts_dir: PathBuf::from(&config.contracts_dir),
        output_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")),
    })
}

async fn run_deploy(command: DeployCommands) -> Result<(), Error> {
    let (ids, glue) = match command {
        DeployCommands::Init => {
            // Ids from an earlier contracts.conf would shadow the new ones.
            set_configuration_from(&CONFIG_FILES[..2])?;
            let config = get_configuration()?;
            deploy::initialize(&deployer(&config)?).await?
        },
        DeployCommands::Upgrade => {
            let config = init_config()?;
            deploy::upgrade(&deployer(&config)?).await?
        },
        DeployCommands::Glue => {
            let config = init_config()?;
            let deployer = deployer(&config)?;
            let ids = deployer.bind_contracts().await?;
            let glue = deploy::write_glue(
                &deployer.output_dir,
                deployer.network,
                &deployer.cli.rpc_url,
                &ids,
            )
            .await?;
            (ids, glue)
        },
    };

    info!("Loan manager {}", ids.loan_manager);
    for (ticker, contract_id) in ids.pools.iter() {
        info!("{} pool {}", ticker, contract_id);
    }
    info!("Contract ids written to {}", glue.display());

    Ok(())
}
