use num_bigint::BigInt;
use num_traits::Signed;
use tracing::info;

use crate::{
    bindings::CurrencyBinding,
    error::Error,
    helpers::converters::stroops_to_decimal_string,
    model::{Balance, PoolState, Positions},
    provider::{Invoker, Signer},
    types::Amount_Pair_Type,
};

pub fn check_deposit(amount: &BigInt, balance: &Balance) -> Result<(), Error> {
    if !balance.has_trustline() {
        return Err(Error::ActionNotAllowed(String::from(
            "Create a trustline for the asset first",
        )));
    }
    if !amount.is_positive() {
        return Err(Error::ActionNotAllowed(String::from(
            "Deposit amount must be positive",
        )));
    }
    if *amount > balance.amount() {
        return Err(Error::ActionNotAllowed(String::from(
            "Not enough funds in the wallet",
        )));
    }

    Ok(())
}

pub fn check_withdraw(
    amount: &BigInt,
    positions: &Positions,
    pool: &PoolState,
) -> Result<(), Error> {
    if !amount.is_positive() {
        return Err(Error::ActionNotAllowed(String::from(
            "Withdraw amount must be positive",
        )));
    }
    if *amount > positions.withdrawable(pool) {
        return Err(Error::ActionNotAllowed(String::from(
            "Amount exceeds the withdrawable balance",
        )));
    }

    Ok(())
}

pub async fn deposit<I: Invoker, W: Signer>(
    binding: &CurrencyBinding<I>,
    wallet: &W,
    amount: &BigInt,
    balance: &Balance,
) -> Result<String, Error> {
    check_deposit(amount, balance)?;

    let user = wallet.address();
    binding.client.set_public_key(user);

    let tx = binding.client.deposit(user, amount).await?;
    tx.sign_and_send(wallet).await?;

    info!("{} deposited {} {}", user, amount, binding.ticker());

    Ok(format!(
        "Successfully deposited {} {}",
        stroops_to_decimal_string(amount),
        binding.ticker()
    ))
}

pub async fn withdraw<I: Invoker, W: Signer>(
    binding: &CurrencyBinding<I>,
    wallet: &W,
    amount: &BigInt,
    positions: &Positions,
    pool: &PoolState,
) -> Result<String, Error> {
    check_withdraw(amount, positions, pool)?;

    let user = wallet.address();
    binding.client.set_public_key(user);

    let tx = binding.client.withdraw(user, amount).await?;
    let sent = tx.sign_and_send(wallet).await?;
    let Amount_Pair_Type(burned_shares, withdrawn) = sent.result;

    info!(
        "{} withdrew {} {} burning {} shares",
        user,
        withdrawn,
        binding.ticker(),
        burned_shares
    );

    Ok(format!(
        "Successfully withdrew {} {}",
        stroops_to_decimal_string(amount),
        binding.ticker()
    ))
}
