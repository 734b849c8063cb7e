use std::{future::Future, sync::Arc};

use crate::{error::Error, model};

use super::{
    contract::StellarCli,
    shell::{Invoker, ShellCommand},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    pub network_passphrase: String,
    pub address: String,
}

/// Holds the user's keys. Key material never passes through this crate,
/// only unsigned and signed transaction envelopes do.
pub trait Signer: Send + Sync {
    fn address(&self) -> &str;

    fn sign_transaction(
        &self,
        xdr: &str,
        options: &SignOptions,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    fn wallet(&self) -> model::Wallet;
}

/// Signs with an identity stored in the stellar CLI keystore.
#[derive(Debug)]
pub struct KeyWallet<I> {
    invoker: Arc<I>,
    cli: StellarCli,
    alias: String,
    address: String,
}

impl<I: Invoker> KeyWallet<I> {
    pub async fn load(
        invoker: Arc<I>,
        cli: StellarCli,
        alias: &str,
    ) -> Result<Self, Error> {
        let command = cli.command(["keys", "address", alias]);
        let address = invoker.run(command).await?;

        if address.is_empty() {
            return Err(Error::WalletNotConnected);
        }

        Ok(KeyWallet {
            invoker,
            cli,
            alias: alias.to_owned(),
            address,
        })
    }
}

impl<I: Invoker> Signer for KeyWallet<I> {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_transaction(
        &self,
        xdr: &str,
        options: &SignOptions,
    ) -> Result<String, Error> {
        if options.address != self.address {
            return Err(Error::ActionNotAllowed(format!(
                "transaction source {} does not match wallet {}",
                options.address, self.address
            )));
        }

        let command = self
            .cli
            .command(["tx", "sign"])
            .flag("sign-with-key", self.alias.as_str())
            .flag("network-passphrase", options.network_passphrase.as_str())
            .stdin(xdr);

        self.invoker.run(command).await
    }

    fn wallet(&self) -> model::Wallet {
        model::Wallet::new(&self.alias, &self.address)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::shell::mock::MockInvoker;

    fn cli() -> StellarCli {
        StellarCli::new("stellar", "http://localhost:8000/soroban/rpc", "Test SDF Network ; September 2015")
    }

    #[tokio::test]
    async fn test_key_wallet_signs_with_alias() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.push_output("GUSER").push_output("SIGNED");

        let wallet = KeyWallet::load(invoker.clone(), cli(), "alice").await.unwrap();
        assert_eq!(wallet.address(), "GUSER");
        assert_eq!(wallet.wallet().display_name, "GUSER");

        let options = SignOptions {
            network_passphrase: String::from("Test SDF Network ; September 2015"),
            address: String::from("GUSER"),
        };
        let signed = wallet.sign_transaction("UNSIGNED", &options).await.unwrap();
        assert_eq!(signed, "SIGNED");

        let commands = invoker.commands();
        assert_eq!(commands[0].to_string(), "stellar keys address alice");
        assert_eq!(commands[1].flag_value("sign-with-key"), Some("alice"));
        assert_eq!(commands[1].stdin.as_deref(), Some("UNSIGNED"));
    }

    #[tokio::test]
    async fn test_key_wallet_rejects_foreign_source() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.push_output("GUSER");

        let wallet = KeyWallet::load(invoker.clone(), cli(), "alice").await.unwrap();
        let options = SignOptions {
            network_passphrase: String::new(),
            address: String::from("GOTHER"),
        };

        assert!(wallet.sign_transaction("UNSIGNED", &options).await.is_err());
        assert_eq!(invoker.commands().len(), 1);
    }
}
