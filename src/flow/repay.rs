use num_bigint::BigInt;
use num_traits::Signed;
use tracing::info;

use crate::{
    error::Error,
    helpers::formatting::format_amount,
    model::Loan,
    provider::{Invoker, LoanManagerClient, Signer},
    types::{Amount_Pair_Type, Amount_Type},
};

pub fn check_repay(loan: &Loan, amount: &BigInt) -> Result<(), Error> {
    if !amount.is_positive() {
        return Err(Error::ActionNotAllowed(String::from(
            "Repay amount must be positive",
        )));
    }
    if *amount > loan.balance() {
        return Err(Error::ActionNotAllowed(String::from(
            "Amount exceeds the loan balance",
        )));
    }

    Ok(())
}

pub fn check_repay_all(loan: &Loan) -> Result<(), Error> {
    if !loan.balance().is_positive() {
        return Err(Error::ActionNotAllowed(String::from(
            "There is no loan balance to repay",
        )));
    }

    Ok(())
}

pub async fn repay<I: Invoker, W: Signer>(
    manager: &LoanManagerClient<I>,
    wallet: &W,
    loan: &Loan,
    amount: &BigInt,
) -> Result<String, Error> {
    check_repay(loan, amount)?;

    let user = wallet.address();
    manager.set_public_key(user);

    let tx = manager.repay(user, amount).await?;
    let sent = tx.sign_and_send(wallet).await?;
    let Amount_Pair_Type(borrowed_left, interest_left) = sent.result;

    info!(
        "{} repaid {} {}, {} borrowed and {} interest left",
        user, amount, loan.borrowed_ticker, borrowed_left, interest_left
    );

    Ok(format!(
        "Successfully repaid {} {}.",
        format_amount(amount),
        loan.borrowed_ticker
    ))
}

/// Closes the loan, allowing the balance to grow by the repay-all margin
/// while the transaction is in flight.
pub async fn repay_all<I: Invoker, W: Signer>(
    manager: &LoanManagerClient<I>,
    wallet: &W,
    loan: &Loan,
) -> Result<String, Error> {
    check_repay_all(loan)?;

    let user = wallet.address();
    manager.set_public_key(user);

    let allowance = loan.repay_all_allowance();
    let tx = manager.repay_and_close_manager(user, &allowance).await?;
    let sent = tx.sign_and_send(wallet).await?;
    let Amount_Type(paid) = sent.result;

    info!(
        "{} closed the {} loan paying {}, allowance {}",
        user, loan.borrowed_ticker, paid, allowance
    );

    Ok(format!(
        "Successfully repaid all of your loan. The collateral {} {} was returned back to your wallet.",
        format_amount(&loan.collateral_amount),
        loan.collateral_ticker
    ))
}
