//! Soroban contract clients driven through the `stellar` CLI.
//!
//! Reads are simulated with `--send=no`. Writes are built with
//! `--build-only`, assembled with `tx simulate`, signed by the wallet and
//! submitted with `tx send`.

use std::sync::{Arc, RwLock};

use anyhow::Context;
use num_bigint::BigInt;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    error::Error,
    model::{Loan, PoolState, Positions, Ticker},
    types::{
        Amount_Pair_Type, Amount_Type, Loan_Type, Pool_State_Type,
        Positions_Type,
    },
};

use super::{
    shell::{Invoker, ShellCommand},
    wallet::{SignOptions, Signer},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StellarCli {
    pub program: String,
    pub rpc_url: String,
    pub network_passphrase: String,
}

impl StellarCli {
    pub fn new(program: &str, rpc_url: &str, network_passphrase: &str) -> Self {
        StellarCli {
            program: program.to_owned(),
            rpc_url: rpc_url.to_owned(),
            network_passphrase: network_passphrase.to_owned(),
        }
    }

    pub fn command<I, S>(&self, args: I) -> ShellCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ShellCommand::new(&self.program).args(args)
    }

    /// Command with the RPC endpoint and passphrase of the configured network.
    pub fn network_command<I, S>(&self, args: I) -> ShellCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command(args)
            .flag("rpc-url", self.rpc_url.as_str())
            .flag("network-passphrase", self.network_passphrase.as_str())
    }
}

/// Parses the JSON a contract call prints. Calls returning `()` print
/// nothing.
pub fn decode_output<T: DeserializeOwned>(output: &str) -> Result<T, Error> {
    let output = output.trim();
    let output = if output.is_empty() { "null" } else { output };
    Ok(serde_json::from_str(output)?)
}

/// A simulated contract call waiting for the wallet's signature.
#[derive(Debug)]
pub struct AssembledTransaction<I, T> {
    invoker: Arc<I>,
    cli: StellarCli,
    pub method: String,
    pub source: String,
    pub xdr: String,
    pub simulated: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction<T> {
    pub method: String,
    pub response: String,
    pub result: T,
}

impl<I: Invoker, T> AssembledTransaction<I, T> {
    pub async fn sign_and_send<W: Signer>(
        self,
        wallet: &W,
    ) -> Result<SentTransaction<T>, Error> {
        let options = SignOptions {
            network_passphrase: self.cli.network_passphrase.to_owned(),
            address: self.source.to_owned(),
        };
        let signed = wallet.sign_transaction(&self.xdr, &options).await?;

        let command = self.cli.network_command(["tx", "send"]).stdin(signed);
        let response = self.invoker.run(command).await?;

        info!("{} sent for {}", self.method, self.source);

        Ok(SentTransaction {
            method: self.method,
            response,
            result: self.simulated,
        })
    }
}

/// Common plumbing of every contract client: the contract id and the
/// account used as transaction source.
#[derive(Debug)]
pub struct ContractClient<I> {
    invoker: Arc<I>,
    cli: StellarCli,
    pub contract_id: String,
    public_key: RwLock<String>,
}

impl<I: Invoker> ContractClient<I> {
    pub fn new(
        invoker: Arc<I>,
        cli: StellarCli,
        contract_id: &str,
        public_key: &str,
    ) -> Self {
        ContractClient {
            invoker,
            cli,
            contract_id: contract_id.to_owned(),
            public_key: RwLock::new(public_key.to_owned()),
        }
    }

    pub fn set_public_key(&self, public_key: &str) {
        let mut guard = match self.public_key.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = public_key.to_owned();
    }

    pub fn public_key(&self) -> String {
        match self.public_key.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn invoke(&self, source: &str, mode: &str) -> ShellCommand {
        self.cli
            .network_command(["contract", "invoke"])
            .flag("id", self.contract_id.as_str())
            .flag("source-account", source)
            .arg(mode)
    }

    fn call(command: ShellCommand, method: &str, args: &[(&str, String)]) -> ShellCommand {
        args.iter().fold(command.arg("--").arg(method), |command, (name, value)| {
            command.flag(name, value.as_str())
        })
    }

    pub async fn read<T: DeserializeOwned>(
        &self,
        method: &str,
        args: &[(&str, String)],
    ) -> Result<T, Error> {
        let source = self.public_key();
        let command = Self::call(self.invoke(&source, "--send=no"), method, args);
        let output = self.invoker.run(command).await?;

        let value = decode_output(&output)
            .with_context(|| format!("unexpected {} output: {}", method, output))?;

        Ok(value)
    }

    pub async fn assemble<T: DeserializeOwned>(
        &self,
        method: &str,
        args: &[(&str, String)],
    ) -> Result<AssembledTransaction<I, T>, Error> {
        let source = self.public_key();
        let simulated = self.read::<T>(method, args).await?;

        let command = Self::call(self.invoke(&source, "--build-only"), method, args);
        let built = self.invoker.run(command).await?;

        let command = self
            .cli
            .network_command(["tx", "simulate"])
            .flag("source-account", source.as_str())
            .stdin(built);
        let xdr = self.invoker.run(command).await?;

        Ok(AssembledTransaction {
            invoker: self.invoker.clone(),
            cli: self.cli.clone(),
            method: method.to_owned(),
            source,
            xdr,
            simulated,
        })
    }

    /// Invokes and submits in one step, signing with a keystore identity.
    /// Only the deployment scripts use this.
    pub async fn send_as(
        &self,
        source: &str,
        method: &str,
        args: &[(&str, String)],
    ) -> Result<String, Error> {
        let command = Self::call(
            self.cli
                .network_command(["contract", "invoke"])
                .flag("id", self.contract_id.as_str())
                .flag("source-account", source),
            method,
            args,
        );
        self.invoker.run(command).await
    }
}

#[derive(Debug)]
pub struct LoanPoolClient<I> {
    pub client: ContractClient<I>,
}

impl<I: Invoker> LoanPoolClient<I> {
    pub fn new(client: ContractClient<I>) -> Self {
        LoanPoolClient { client }
    }

    pub fn contract_id(&self) -> &str {
        &self.client.contract_id
    }

    pub fn set_public_key(&self, public_key: &str) {
        self.client.set_public_key(public_key);
    }

    pub async fn deposit(
        &self,
        user: &str,
        amount: &BigInt,
    ) -> Result<AssembledTransaction<I, Amount_Type>, Error> {
        self.client
            .assemble(
                "deposit",
                &[("user", user.to_owned()), ("amount", amount.to_string())],
            )
            .await
    }

    /// Resolves to `(burned_shares, amount)`.
    pub async fn withdraw(
        &self,
        user: &str,
        amount: &BigInt,
    ) -> Result<AssembledTransaction<I, Amount_Pair_Type>, Error> {
        self.client
            .assemble(
                "withdraw",
                &[("user", user.to_owned()), ("amount", amount.to_string())],
            )
            .await
    }

    pub async fn get_pool_state(&self) -> Result<PoolState, Error> {
        let state: Pool_State_Type = self.client.read("get_pool_state", &[]).await?;
        Ok(PoolState::from(state))
    }

    pub async fn get_user_positions(&self, user: &str) -> Result<Positions, Error> {
        let positions: Positions_Type = self
            .client
            .read("get_user_positions", &[("user", user.to_owned())])
            .await?;
        Ok(Positions::from(positions))
    }
}

#[derive(Debug)]
pub struct LoanManagerClient<I> {
    pub client: ContractClient<I>,
}

impl<I: Invoker> LoanManagerClient<I> {
    pub fn new(client: ContractClient<I>) -> Self {
        LoanManagerClient { client }
    }

    pub fn contract_id(&self) -> &str {
        &self.client.contract_id
    }

    pub fn set_public_key(&self, public_key: &str) {
        self.client.set_public_key(public_key);
    }

    pub async fn create_loan(
        &self,
        user: &str,
        borrowed: &BigInt,
        borrowed_from: &str,
        collateral: &BigInt,
        collateral_from: &str,
    ) -> Result<AssembledTransaction<I, ()>, Error> {
        self.client
            .assemble(
                "create_loan",
                &[
                    ("user", user.to_owned()),
                    ("borrowed", borrowed.to_string()),
                    ("borrowed_from", borrowed_from.to_owned()),
                    ("collateral", collateral.to_string()),
                    ("collateral_from", collateral_from.to_owned()),
                ],
            )
            .await
    }

    pub async fn repay(
        &self,
        user: &str,
        amount: &BigInt,
    ) -> Result<AssembledTransaction<I, Amount_Pair_Type>, Error> {
        self.client
            .assemble(
                "repay",
                &[("user", user.to_owned()), ("amount", amount.to_string())],
            )
            .await
    }

    pub async fn repay_and_close_manager(
        &self,
        user: &str,
        max_allowed_amount: &BigInt,
    ) -> Result<AssembledTransaction<I, Amount_Type>, Error> {
        self.client
            .assemble(
                "repay_and_close_manager",
                &[
                    ("user", user.to_owned()),
                    ("max_allowed_amount", max_allowed_amount.to_string()),
                ],
            )
            .await
    }

    /// Raw loan record, pool addresses are resolved by the caller.
    pub async fn get_loan(&self, user: &str) -> Result<Loan_Type, Error> {
        self.client
            .read("get_loan", &[("addr", user.to_owned())])
            .await
    }

    pub async fn get_price(&self, ticker: Ticker) -> Result<BigInt, Error> {
        let Amount_Type(price) = self
            .client
            .read("get_price", &[("token", ticker.to_string())])
            .await?;
        Ok(price)
    }

    pub async fn initialize(&self, admin: &str) -> Result<String, Error> {
        self.client
            .send_as(admin, "initialize", &[("admin", admin.to_owned())])
            .await
    }

    pub async fn deploy_pool(
        &self,
        source: &str,
        wasm_hash: &str,
        salt: &str,
        token_address: &str,
        ticker: Ticker,
        liquidation_threshold: i64,
    ) -> Result<String, Error> {
        let output = self
            .client
            .send_as(
                source,
                "deploy_pool",
                &[
                    ("wasm_hash", wasm_hash.to_owned()),
                    ("salt", salt.to_owned()),
                    ("token_address", token_address.to_owned()),
                    ("ticker", ticker.to_string()),
                    ("liquidation_threshold", liquidation_threshold.to_string()),
                ],
            )
            .await?;

        Ok(output.trim_matches('"').to_owned())
    }

    pub async fn upgrade(
        &self,
        source: &str,
        new_manager_wasm_hash: &str,
        new_pool_wasm_hash: &str,
    ) -> Result<String, Error> {
        self.client
            .send_as(
                source,
                "upgrade",
                &[
                    ("new_manager_wasm_hash", new_manager_wasm_hash.to_owned()),
                    ("new_pool_wasm_hash", new_pool_wasm_hash.to_owned()),
                ],
            )
            .await
    }
}

/// Turns a raw loan into the domain type, resolving pool addresses with
/// `by_address`.
pub fn loan_from_type<F>(loan: Loan_Type, by_address: F) -> Result<Loan, Error>
where
    F: Fn(&str) -> Option<Ticker>,
{
    let borrowed_ticker = by_address(&loan.borrowed_from).ok_or_else(|| {
        Error::NotSupportedCurrency(format!("Pool with id {} not found", loan.borrowed_from))
    })?;
    let collateral_ticker = by_address(&loan.collateral_from).ok_or_else(|| {
        Error::NotSupportedCurrency(format!(
            "Pool with id {} not found",
            loan.collateral_from
        ))
    })?;

    Ok(Loan {
        borrower: loan.borrower,
        borrowed_amount: loan.borrowed_amount,
        borrowed_ticker,
        collateral_amount: loan.collateral_amount,
        collateral_ticker,
        health_factor: loan.health_factor,
        unpaid_interest: loan.unpaid_interest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{shell::mock::MockInvoker, wallet::mock::MockWallet};

    fn cli() -> StellarCli {
        StellarCli::new("stellar", "https://soroban-testnet.stellar.org", "Test SDF Network ; September 2015")
    }

    fn pool(invoker: &Arc<MockInvoker>) -> LoanPoolClient<MockInvoker> {
        LoanPoolClient::new(ContractClient::new(invoker.clone(), cli(), "CPOOL", "GGENESIS"))
    }

    #[tokio::test]
    async fn test_read_pool_state() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.push_output(
            r#"{"annual_interest_rate":"200000","available_balance_tokens":"600","total_balance_shares":"1000","total_balance_tokens":"1100"}"#,
        );

        let state = pool(&invoker).get_pool_state().await.unwrap();
        assert_eq!(state.total_balance_tokens, BigInt::from(1100));
        assert_eq!(state.annual_interest_rate, BigInt::from(200_000));

        let command = &invoker.commands()[0];
        assert_eq!(command.flag_value("id"), Some("CPOOL"));
        assert_eq!(command.flag_value("source-account"), Some("GGENESIS"));
        assert!(command.has_arg("--send=no"));
        assert_eq!(command.args.last().map(String::as_str), Some("get_pool_state"));
    }

    #[tokio::test]
    async fn test_read_reports_bad_output() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.push_output("not json");

        let result = pool(&invoker).get_pool_state().await;
        assert!(matches!(result, Err(Error::AnyHowError(_))));
    }

    #[tokio::test]
    async fn test_write_uses_public_key_and_sends_signed() {
        let invoker = Arc::new(MockInvoker::new());
        invoker
            .push_output(r#"["900","1000"]"#)
            .push_output("BUILT")
            .push_output("ASSEMBLED")
            .push_output(r#"{"status":"SUCCESS"}"#);

        let client = pool(&invoker);
        client.set_public_key("GUSER");

        let tx = client.withdraw("GUSER", &BigInt::from(1000)).await.unwrap();
        assert_eq!(tx.xdr, "ASSEMBLED");

        let wallet = MockWallet::new("GUSER");
        let sent = tx.sign_and_send(&wallet).await.unwrap();
        assert_eq!(sent.result, Amount_Pair_Type(BigInt::from(900), BigInt::from(1000)));

        let commands = invoker.commands();
        assert_eq!(commands.len(), 4);
        assert!(commands[1].has_arg("--build-only"));
        assert_eq!(commands[1].flag_value("source-account"), Some("GUSER"));
        assert_eq!(commands[1].flag_value("amount"), Some("1000"));
        assert_eq!(commands[2].stdin.as_deref(), Some("BUILT"));
        assert_eq!(commands[3].stdin.as_deref(), Some("signed:ASSEMBLED"));
        assert_eq!(*wallet.signed.lock().unwrap(), vec![String::from("ASSEMBLED")]);
    }

    #[tokio::test]
    async fn test_rejected_signature_is_not_sent() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.push_output("\"5\"").push_output("BUILT").push_output("ASSEMBLED");

        let tx = pool(&invoker).deposit("GUSER", &BigInt::from(5)).await.unwrap();
        let result = tx.sign_and_send(&MockWallet::rejecting("GUSER")).await;

        assert!(result.is_err());
        assert_eq!(invoker.commands().len(), 3);
    }

    #[tokio::test]
    async fn test_get_price_and_loan() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.push_output("\"1250000000000000\"").push_output(
            r#"{"borrower":"GUSER","borrowed_amount":"100","borrowed_from":"CUSDC","collateral_amount":"1500","collateral_from":"CXLM","health_factor":"15000000","unpaid_interest":"3"}"#,
        );

        let manager = LoanManagerClient::new(ContractClient::new(invoker.clone(), cli(), "CMANAGER", "GGENESIS"));

        let price = manager.get_price(Ticker::Usdc).await.unwrap();
        assert_eq!(price, BigInt::from(1_250_000_000_000_000_i64));
        assert_eq!(invoker.commands()[0].flag_value("token"), Some("USDC"));

        let raw = manager.get_loan("GUSER").await.unwrap();
        let loan = loan_from_type(raw, |address| match address {
            "CUSDC" => Some(Ticker::Usdc),
            "CXLM" => Some(Ticker::Xlm),
            _ => None,
        })
        .unwrap();
        assert_eq!(loan.borrowed_ticker, Ticker::Usdc);
        assert_eq!(loan.collateral_ticker, Ticker::Xlm);
        assert_eq!(loan.balance(), BigInt::from(103));
    }

    #[test]
    fn test_loan_from_unknown_pool() {
        let raw = Loan_Type {
            borrower: String::from("GUSER"),
            borrowed_amount: BigInt::from(1),
            borrowed_from: String::from("CUNKNOWN"),
            collateral_amount: BigInt::from(1),
            collateral_from: String::from("CXLM"),
            health_factor: BigInt::from(1),
            unpaid_interest: BigInt::from(0),
        };
        assert!(matches!(
            loan_from_type(raw, |_| None),
            Err(Error::NotSupportedCurrency(_))
        ));
    }

    #[test]
    fn test_decode_empty_output_as_unit() {
        assert!(decode_output::<()>("").is_ok());
        assert!(decode_output::<()>("null").is_ok());
    }
}
