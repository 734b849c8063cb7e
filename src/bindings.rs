//! Ties every supported currency to its deployed loan pool.

use std::sync::Arc;

use crate::{
    model::{Currency, PerCurrency, Ticker},
    provider::{ContractClient, Invoker, LoanPoolClient, StellarCli},
};

#[derive(Debug)]
pub struct CurrencyBinding<I> {
    pub currency: &'static Currency,
    pub icon: &'static str,
    pub contract_id: String,
    pub client: LoanPoolClient<I>,
}

impl<I> CurrencyBinding<I> {
    pub fn ticker(&self) -> Ticker {
        self.currency.ticker
    }
}

#[derive(Debug)]
pub struct CurrencyBindings<I> {
    bindings: PerCurrency<CurrencyBinding<I>>,
}

impl<I: Invoker> CurrencyBindings<I> {
    pub fn new(
        invoker: Arc<I>,
        cli: &StellarCli,
        pool_ids: &PerCurrency<String>,
        public_key: &str,
    ) -> Self {
        let bindings = PerCurrency::from_fn(|ticker| {
            let currency = ticker.currency();
            let contract_id = pool_ids.get(ticker).to_owned();
            let client = LoanPoolClient::new(ContractClient::new(
                invoker.clone(),
                cli.clone(),
                &contract_id,
                public_key,
            ));

            CurrencyBinding {
                currency,
                icon: currency.icon,
                contract_id,
                client,
            }
        });

        CurrencyBindings { bindings }
    }

    pub fn get(&self, ticker: Ticker) -> &CurrencyBinding<I> {
        self.bindings.get(ticker)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ticker, &CurrencyBinding<I>)> {
        self.bindings.iter()
    }

    /// Ticker of the pool deployed at `address`.
    pub fn by_address(&self, address: &str) -> Option<Ticker> {
        self.iter()
            .find(|(_, binding)| binding.contract_id == address)
            .map(|(ticker, _)| ticker)
    }

    /// Source account of every pool client, set when a wallet connects and
    /// right before a transaction is built.
    pub fn set_public_key(&self, public_key: &str) {
        for (_, binding) in self.iter() {
            binding.client.set_public_key(public_key);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::shell::mock::MockInvoker;

    #[test]
    fn test_by_address() {
        let invoker = Arc::new(MockInvoker::new());
        let bindings = fixtures::bindings(&invoker);

        assert_eq!(bindings.by_address("CUSDCPOOL"), Some(Ticker::Usdc));
        assert_eq!(bindings.by_address("CXLMPOOL"), Some(Ticker::Xlm));
        assert_eq!(bindings.by_address("CUNKNOWN"), None);
        assert_eq!(bindings.get(Ticker::Eurc).icon, "/images/eurc.svg");
    }

    #[test]
    fn test_set_public_key_updates_every_client() {
        let invoker = Arc::new(MockInvoker::new());
        let bindings = fixtures::bindings(&invoker);

        bindings.set_public_key("GUSER");

        for (_, binding) in bindings.iter() {
            assert_eq!(binding.client.client.public_key(), "GUSER");
        }
    }
}
