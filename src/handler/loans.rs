use tracing::debug;

use crate::{
    bindings::CurrencyBindings,
    error::Error,
    model::Loan,
    provider::{contract::loan_from_type, Invoker, LoanManagerClient},
};

/// Loans of `address`. The loan manager keeps at most one loan per account
/// and fails the call when there is none.
pub async fn fetch_loans<I: Invoker>(
    manager: &LoanManagerClient<I>,
    bindings: &CurrencyBindings<I>,
    address: &str,
) -> Vec<Loan> {
    match fetch_loan(manager, bindings, address).await {
        Ok(loan) => vec![loan],
        Err(err) => {
            debug!("No loan for {}: {}", address, err);
            vec![]
        },
    }
}

pub async fn fetch_loan<I: Invoker>(
    manager: &LoanManagerClient<I>,
    bindings: &CurrencyBindings<I>,
    address: &str,
) -> Result<Loan, Error> {
    let loan = manager.get_loan(address).await?;
    loan_from_type(loan, |pool| bindings.by_address(pool))
}
