pub use self::{
    contract::{
        AssembledTransaction, ContractClient, LoanManagerClient, LoanPoolClient,
        SentTransaction, StellarCli,
    },
    horizon::{Horizon, TransactionSubmitter},
    shell::{Invoker, Shell, ShellCommand},
    wallet::{KeyWallet, SignOptions, Signer},
};

pub mod contract;
pub mod horizon;
pub mod shell;
pub mod wallet;
