use tracing::info;

use crate::{
    bindings::CurrencyBindings,
    error::Error,
    helpers::{converters::stroops_to_decimal_string, health_factor::BorrowQuote},
    model::{Balance, Currency},
    provider::{
        Invoker, LoanManagerClient, ShellCommand, SignOptions, Signer, StellarCli,
        TransactionSubmitter,
    },
};

/// Base fee of the classic trustline transaction, in stroops.
pub const TRUSTLINE_FEE: u32 = 100_000;

pub fn check_borrow(quote: &BorrowQuote) -> Result<(), Error> {
    if quote.can_borrow() {
        return Ok(());
    }

    let reasons = quote
        .blockers
        .iter()
        .map(|blocker| blocker.message())
        .collect::<Vec<&str>>()
        .join(", ");

    Err(Error::ActionNotAllowed(reasons))
}

pub fn check_trustline(currency: &Currency, balance: &Balance) -> Result<String, Error> {
    let line = currency.asset_line()?;

    if balance.has_trustline() {
        return Err(Error::ActionNotAllowed(format!(
            "Trustline for {} already exists",
            currency.ticker
        )));
    }

    Ok(line)
}

pub async fn borrow<I: Invoker, W: Signer>(
    manager: &LoanManagerClient<I>,
    bindings: &CurrencyBindings<I>,
    wallet: &W,
    quote: &BorrowQuote,
) -> Result<String, Error> {
    check_borrow(quote)?;

    let request = &quote.request;
    let user = wallet.address();
    manager.set_public_key(user);

    let tx = manager
        .create_loan(
            user,
            &request.loan_amount,
            &bindings.get(request.loan_ticker).contract_id,
            &request.collateral_amount,
            &bindings.get(request.collateral_ticker).contract_id,
        )
        .await?;
    tx.sign_and_send(wallet).await?;

    info!(
        "{} borrowed {} {} against {} {}",
        user,
        request.loan_amount,
        request.loan_ticker,
        request.collateral_amount,
        request.collateral_ticker
    );

    Ok(format!(
        "Successfully borrowed {} {} with {} {} as collateral",
        stroops_to_decimal_string(&request.loan_amount),
        request.loan_ticker,
        stroops_to_decimal_string(&request.collateral_amount),
        request.collateral_ticker
    ))
}

fn change_trust(cli: &StellarCli, source: &str, line: &str) -> ShellCommand {
    cli.network_command(["tx", "new", "change-trust"])
        .flag("source-account", source)
        .flag("line", line)
        .flag("fee", TRUSTLINE_FEE.to_string())
        .arg("--build-only")
}

/// Classic `change_trust` so the wallet can hold `currency`.
pub async fn add_trustline<I, W, S>(
    cli: &StellarCli,
    invoker: &I,
    submitter: &S,
    wallet: &W,
    currency: &Currency,
    balance: &Balance,
) -> Result<String, Error>
where
    I: Invoker,
    W: Signer,
    S: TransactionSubmitter,
{
    let line = check_trustline(currency, balance)?;
    let user = wallet.address();

    let xdr = invoker.run(change_trust(cli, user, &line)).await?;

    let options = SignOptions {
        network_passphrase: cli.network_passphrase.to_owned(),
        address: user.to_owned(),
    };
    let signed = wallet.sign_transaction(&xdr, &options).await?;
    let result = submitter.submit_transaction(&signed).await?;

    info!("Trustline {} added for {} in {}", line, user, result.hash);

    Ok(format!("Successfully added a trustline for {}", currency.ticker))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use num_bigint::BigInt;

    use super::*;
    use crate::{
        bindings::fixtures,
        helpers::health_factor::{BorrowBlocker, BorrowRequest},
        model::{PerCurrency, Ticker, CURRENCY_EURC, CURRENCY_USDC, CURRENCY_XLM},
        provider::{
            horizon::mock::MockSubmitter, shell::mock::MockInvoker,
            wallet::mock::MockWallet, ContractClient,
        },
    };

    fn prices() -> PerCurrency<BigInt> {
        PerCurrency::from_fn(|ticker| match ticker {
            Ticker::Xlm => BigInt::from(10_000_000_000_000_i64),
            Ticker::Usdc | Ticker::Eurc => BigInt::from(100_000_000_000_000_i64),
        })
    }

    fn balances() -> PerCurrency<Balance> {
        PerCurrency::from_fn(|_| Balance::Trustline {
            balance: BigInt::from(1_000_000_000_i64),
        })
    }

    // 10 USDC against 150 XLM, health factor 1.5
    fn quote() -> BorrowQuote {
        let request = BorrowRequest {
            loan_ticker: Ticker::Usdc,
            loan_amount: BigInt::from(100_000_000),
            collateral_ticker: Ticker::Xlm,
            collateral_amount: BigInt::from(1_500_000_000_i64),
        };
        let mut balances = balances();
        *balances.get_mut(Ticker::Xlm) = Balance::Trustline {
            balance: BigInt::from(2_000_000_000_i64),
        };
        BorrowQuote::new(&prices(), request, &balances)
    }

    fn manager(invoker: &Arc<MockInvoker>) -> LoanManagerClient<MockInvoker> {
        LoanManagerClient::new(ContractClient::new(
            invoker.clone(),
            fixtures::cli(),
            "CMANAGER",
            "GGENESIS",
        ))
    }

    #[test]
    fn test_check_borrow_lists_blockers() {
        assert!(check_borrow(&quote()).is_ok());

        let mut blocked = quote();
        blocked.blockers = vec![BorrowBlocker::ZeroLoan, BorrowBlocker::UnhealthyLoan];

        match check_borrow(&blocked) {
            Err(Error::ActionNotAllowed(reasons)) => assert_eq!(
                reasons,
                "Enter an amount to borrow, Loan would be liquidated immediately"
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_borrow_creates_loan() {
        let invoker = Arc::new(MockInvoker::new());
        let manager = manager(&invoker);
        let bindings = fixtures::bindings(&invoker);

        let message = borrow(&manager, &bindings, &MockWallet::new("GUSER"), &quote())
            .await
            .unwrap();

        assert_eq!(
            message,
            "Successfully borrowed 10 USDC with 150 XLM as collateral"
        );

        let commands = invoker.commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[1].flag_value("id"), Some("CMANAGER"));
        assert_eq!(commands[1].flag_value("source-account"), Some("GUSER"));
        assert_eq!(commands[1].flag_value("borrowed_from"), Some("CUSDCPOOL"));
        assert_eq!(commands[1].flag_value("collateral_from"), Some("CXLMPOOL"));
        assert_eq!(commands[1].flag_value("collateral"), Some("1500000000"));
    }

    #[tokio::test]
    async fn test_blocked_borrow_sends_nothing() {
        let invoker = Arc::new(MockInvoker::new());
        let mut blocked = quote();
        blocked.blockers.push(BorrowBlocker::NoTrustline);

        let result = borrow(
            &manager(&invoker),
            &fixtures::bindings(&invoker),
            &MockWallet::new("GUSER"),
            &blocked,
        )
        .await;

        assert!(result.is_err());
        assert!(invoker.commands().is_empty());
    }

    #[test]
    fn test_check_trustline() {
        assert_eq!(
            check_trustline(&CURRENCY_USDC, &Balance::NoTrustline).unwrap(),
            format!("USDC:{}", CURRENCY_USDC.issuer.unwrap())
        );
        assert!(check_trustline(&CURRENCY_XLM, &Balance::NoTrustline).is_err());
        assert!(check_trustline(
            &CURRENCY_USDC,
            &Balance::Trustline {
                balance: BigInt::from(0)
            }
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_add_trustline() {
        let invoker = MockInvoker::new();
        invoker.push_output("UNSIGNED");
        let submitter = MockSubmitter::default();
        let wallet = MockWallet::new("GUSER");

        let message = add_trustline(
            &fixtures::cli(),
            &invoker,
            &submitter,
            &wallet,
            &CURRENCY_USDC,
            &Balance::NoTrustline,
        )
        .await
        .unwrap();

        assert_eq!(message, "Successfully added a trustline for USDC");

        let command = &invoker.commands()[0];
        assert!(command.has_arg("change-trust"));
        assert!(command.has_arg("--build-only"));
        assert_eq!(command.flag_value("source-account"), Some("GUSER"));
        assert_eq!(command.flag_value("fee"), Some("100000"));
        assert_eq!(
            *submitter.submitted.lock().unwrap(),
            vec![String::from("signed:UNSIGNED")]
        );
    }

    #[tokio::test]
    async fn test_add_trustline_reports_horizon_failure() {
        let invoker = MockInvoker::new();
        invoker.push_output("UNSIGNED");

        let result = add_trustline(
            &fixtures::cli(),
            &invoker,
            &MockSubmitter::failing("tx_bad_seq"),
            &MockWallet::new("GUSER"),
            &CURRENCY_EURC,
            &Balance::NoTrustline,
        )
        .await;

        assert!(matches!(result, Err(Error::Horizon(_))));
    }
}
