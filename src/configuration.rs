use std::{
    env, fmt, fs, io::ErrorKind, ops::Deref, str::FromStr, sync::Arc,
    time::Duration,
};

use tracing::info;

use crate::{
    bindings::CurrencyBindings,
    cache::TimedCache,
    error::Error,
    handler::{
        pool_state::{PoolWatcher, DEFAULT_POLL_INTERVAL},
        wallet_state::WalletState,
    },
    model::PerCurrency,
    provider::{
        ContractClient, Horizon, Invoker, LoanManagerClient, Shell, StellarCli,
    },
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

/// Everything the server and the command line share. Built once at
/// startup and passed down explicitly.
#[derive(Debug)]
pub struct State<I = Shell> {
    pub config: Config,
    pub invoker: Arc<I>,
    pub cli: StellarCli,
    pub horizon: Horizon,
    pub bindings: Arc<CurrencyBindings<I>>,
    pub manager: Arc<LoanManagerClient<I>>,
    pub pools: PoolWatcher<I>,
    pub wallet_cache: TimedCache<String, WalletState>,
}

impl<I: Invoker + 'static> State<I> {
    pub fn new(config: Config, invoker: Arc<I>) -> Result<State<I>, Error> {
        let contract_ids = config.contract_ids.clone().ok_or_else(|| {
            Error::ConfigurationError(String::from(
                "contract ids are missing, run `laina deploy init` or set CONTRACT_ID_*",
            ))
        })?;

        let cli = config.stellar_cli();
        let horizon = Horizon::new(&config.horizon_url, config.timeout)?;
        let public_key = config.network.genesis_account();

        let bindings = Arc::new(CurrencyBindings::new(
            invoker.clone(),
            &cli,
            &contract_ids.pools,
            public_key,
        ));
        let manager = Arc::new(LoanManagerClient::new(ContractClient::new(
            invoker.clone(),
            cli.clone(),
            &contract_ids.loan_manager,
            public_key,
        )));

        let interval = Duration::from_secs(config.poll_interval);
        let pools = PoolWatcher::new(bindings.clone(), manager.clone(), interval);
        let wallet_cache = TimedCache::new(interval);

        info!(
            "Using {} network, loan manager {}",
            config.network, contract_ids.loan_manager
        );

        Ok(Self {
            config,
            invoker,
            cli,
            horizon,
            bindings,
            manager,
            pools,
            wallet_cache,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Futurenet,
    Public,
    Standalone,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Futurenet => "futurenet",
            Network::Public => "public",
            Network::Standalone => "standalone",
        }
    }

    pub fn rpc_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://soroban-testnet.stellar.org",
            Network::Futurenet => "https://rpc-futurenet.stellar.org",
            Network::Public => "https://mainnet.sorobanrpc.com",
            Network::Standalone => "http://localhost:8000/soroban/rpc",
        }
    }

    pub fn horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Futurenet => "https://horizon-futurenet.stellar.org",
            Network::Public => "https://horizon.stellar.org",
            Network::Standalone => "http://localhost:8000",
        }
    }

    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Futurenet => "Test SDF Future Network ; October 2022",
            Network::Public => "Public Global Stellar Network ; September 2015",
            Network::Standalone => "Standalone Network ; February 2017",
        }
    }

    /// Funded account on each network, used as the source of read-only
    /// simulations before a wallet is connected.
    pub fn genesis_account(&self) -> &'static str {
        match self {
            Network::Public => "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7",
            Network::Testnet => "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H",
            Network::Futurenet => "GADNDFP7HM3KFVHOQBBJDBGRONMKQVUYKXI6OYNDMS2ZIK7L6HA3F2RF",
            Network::Standalone => "GBZXN7PIRZGNMHGA7MUUUF4GWPY5AYPV6LY4UV2GL6VJGIQRXFDNMADI",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "futurenet" => Ok(Network::Futurenet),
            "public" | "mainnet" => Ok(Network::Public),
            "standalone" | "local" => Ok(Network::Standalone),
            _ => Err(Error::ConfigurationError(format!(
                "unknown network {}",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractIds {
    pub loan_manager: String,
    pub pools: PerCurrency<String>,
}

impl ContractIds {
    /// `CONTRACT_ID_*` variables, `None` while any of them is unset.
    pub fn from_env() -> Option<ContractIds> {
        let loan_manager = env::var("CONTRACT_ID_LOAN_MANAGER").ok()?;
        let pools = PerCurrency::try_from_fn(|ticker| {
            env::var(format!(
                "CONTRACT_ID_{}",
                ticker.currency().loan_pool_name.to_uppercase()
            ))
        })
        .ok()?;

        Some(ContractIds {
            loan_manager,
            pools,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    pub rpc_url: String,
    pub horizon_url: String,
    pub stellar_cli: String,
    pub timeout: u64,
    pub poll_interval: u64,
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub static_dir: String,
    pub account: Option<String>,
    pub contracts_dir: String,
    pub contract_ids: Option<ContractIds>,
}

impl Config {
    pub fn stellar_cli(&self) -> StellarCli {
        StellarCli::new(&self.stellar_cli, &self.rpc_url, self.network.passphrase())
    }

    /// Keystore identity used for signing from the command line.
    pub fn account(&self) -> Result<&str, Error> {
        self.account.as_deref().ok_or_else(|| {
            Error::ConfigurationError(String::from("SOROBAN_ACCOUNT is not set"))
        })
    }
}

pub fn get_configuration() -> Result<Config, Error> {
    let network: Network = env::var("SOROBAN_NETWORK")?.parse()?;
    let rpc_url = env::var("SOROBAN_RPC_URL")
        .unwrap_or_else(|_| network.rpc_url().to_owned());
    let horizon_url = env::var("HORIZON_URL")
        .unwrap_or_else(|_| network.horizon_url().to_owned());
    let stellar_cli = env::var("STELLAR_CLI")?;
    let timeout = env::var("TIMEOUT")?.parse()?;
    let poll_interval = match env::var("POLL_INTERVAL_IN_SEC") {
        Ok(value) => value.parse()?,
        Err(_) => DEFAULT_POLL_INTERVAL.as_secs(),
    };
    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let allowed_origins = env::var("ALLOWED_ORIGINS")?
        .split(',')
        .map(|item| item.trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect::<Vec<String>>();
    let static_dir = format!(
        "{}/{}",
        env!("CARGO_MANIFEST_DIR"),
        env::var("STATIC_DIRECTORY")?
    );
    let account = env::var("SOROBAN_ACCOUNT").ok();
    let contracts_dir = env::var("CONTRACTS_DIRECTORY")
        .unwrap_or_else(|_| env!("CARGO_MANIFEST_DIR").to_owned());
    let contract_ids = ContractIds::from_env();

    let config = Config {
        network,
        rpc_url,
        horizon_url,
        stellar_cli,
        timeout,
        poll_interval,
        server_host,
        port,
        allowed_origins,
        static_dir,
        account,
        contracts_dir,
        contract_ids,
    };

    Ok(config)
}

pub const CONFIG_FILES: [&str; 3] = [".env", "laina.conf", "contracts.conf"];

pub fn set_configuration() -> Result<(), Error> {
    set_configuration_from(&CONFIG_FILES)
}

/// Loads `files` from the manifest directory, later files overriding
/// earlier ones. Missing files are skipped.
pub fn set_configuration_from(files: &[&str]) -> Result<(), Error> {
    let directory = env!("CARGO_MANIFEST_DIR");

    for file in files {
        let path = format!("{}/{}", directory, file);
        match fs::read_to_string(&path) {
            Ok(config_string) => parse_config_string(&config_string),
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn parse_config_string(config: &str) {
    for (key, value) in parse_config_pairs(config) {
        env::set_var(key, value);
    }
}

/// `KEY=value` lines, comments skipped. `PUBLIC_` variables are also
/// exported without the prefix.
pub fn parse_config_pairs(config: &str) -> Vec<(String, String)> {
    let mut pairs = vec![];

    for line in config.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            if let Some(stripped) = key.strip_prefix("PUBLIC_") {
                pairs.push((stripped.to_owned(), value.to_owned()));
            }
            pairs.push((key.to_owned(), value.to_owned()));
        }
    }

    pairs
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use crate::bindings::fixtures::pool_ids;

    pub fn config() -> Config {
        let network = Network::Testnet;
        Config {
            network,
            rpc_url: network.rpc_url().to_owned(),
            horizon_url: String::from("http://localhost:8000"),
            stellar_cli: String::from("stellar"),
            timeout: 10,
            poll_interval: 60,
            server_host: String::from("127.0.0.1"),
            port: 8080,
            allowed_origins: vec![],
            static_dir: String::from("static"),
            account: Some(String::from("alice")),
            contracts_dir: String::from("contracts"),
            contract_ids: Some(ContractIds {
                loan_manager: String::from("CMANAGER"),
                pools: pool_ids(),
            }),
        }
    }
}
