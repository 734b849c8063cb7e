use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use tokio::fs;
use tracing::info;

use crate::{
    configuration::{ContractIds, Network},
    error::Error,
    model::PerCurrency,
    provider::{ContractClient, Invoker, LoanManagerClient, ShellCommand, StellarCli},
};

pub const LOAN_MANAGER: &str = "loan_manager";
pub const LOAN_POOL: &str = "loan_pool";

const WASM_DIR: &str = "target/wasm32-unknown-unknown/release";
const WASM_HASH_DIR: &str = ".stellar/contract-wasm-hash";
const CONTRACT_ID_DIR: &str = ".stellar/contract-ids";

/// Runs the deployment steps against a contracts workspace, signing with a
/// keystore identity.
#[derive(Debug)]
pub struct Deployer<I> {
    pub invoker: Arc<I>,
    pub cli: StellarCli,
    pub network: Network,
    pub account: String,
    pub contracts_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl<I: Invoker> Deployer<I> {
    pub fn wasm_path(&self, name: &str) -> PathBuf {
        self.contracts_dir.join(WASM_DIR).join(format!("{}.wasm", name))
    }

    pub fn wasm_hash_path(&self, name: &str) -> PathBuf {
        self.contracts_dir.join(WASM_HASH_DIR).join(format!("{}.txt", name))
    }

    pub fn contract_id_path(&self, name: &str) -> PathBuf {
        self.contracts_dir.join(CONTRACT_ID_DIR).join(format!("{}.txt", name))
    }

    async fn exe(&self, command: ShellCommand) -> Result<String, Error> {
        self.invoker.run(command).await
    }

    /// Adds the identity to the keystore. The secret is taken from
    /// `SOROBAN_SECRET_KEY`.
    pub async fn load_account(&self) -> Result<(), Error> {
        self.exe(self.cli.command(["keys", "add", self.account.as_str()]))
            .await?;
        Ok(())
    }

    pub async fn fund_account(&self) -> Result<(), Error> {
        self.exe(
            self.cli
                .network_command(["keys", "fund", self.account.as_str()]),
        )
        .await?;
        Ok(())
    }

    pub async fn build_contracts(&self) -> Result<(), Error> {
        let wasm_dir = self.contracts_dir.join(WASM_DIR);
        remove_build_outputs(&wasm_dir).await?;

        let directory = path_string(&self.contracts_dir);
        self.exe(ShellCommand::new("make").flag("directory", directory).arg("build"))
            .await?;
        Ok(())
    }

    pub async fn install_contracts(&self) -> Result<(), Error> {
        self.install(LOAN_MANAGER).await?;
        self.install(LOAN_POOL).await?;
        Ok(())
    }

    /// Uploads the wasm and stores its hash.
    pub async fn install(&self, name: &str) -> Result<String, Error> {
        let command = self
            .cli
            .network_command(["contract", "install"])
            .flag("wasm", path_string(&self.wasm_path(name)))
            .flag("source-account", self.account.as_str())
            .arg("--ignore-checks");
        let hash = self.exe(command).await?;

        write_text_file(&self.wasm_hash_path(name), &hash).await?;
        info!("Installed {} with hash {}", name, hash);

        Ok(hash)
    }

    /// Deploys the wasm and stores the contract id.
    pub async fn deploy(&self, name: &str) -> Result<String, Error> {
        let command = self
            .cli
            .network_command(["contract", "deploy"])
            .flag("wasm", path_string(&self.wasm_path(name)))
            .flag("source-account", self.account.as_str())
            .arg("--ignore-checks");
        let contract_id = self.exe(command).await?;

        write_text_file(&self.contract_id_path(name), &contract_id).await?;
        info!("Deployed {} at {}", name, contract_id);

        Ok(contract_id)
    }

    pub async fn read_wasm_hash(&self, name: &str) -> Result<String, Error> {
        read_text_file(&self.wasm_hash_path(name)).await
    }

    /// Contract id of `name`, `CONTRACT_ID_<NAME>` taking precedence over
    /// the stored id.
    pub async fn contract_id(&self, name: &str) -> Result<String, Error> {
        if let Ok(value) = env::var(contract_id_var(name)) {
            if !value.is_empty() {
                return Ok(value);
            }
        }

        read_text_file(&self.contract_id_path(name)).await
    }

    pub async fn bind_contracts(&self) -> Result<ContractIds, Error> {
        let loan_manager = self.contract_id(LOAN_MANAGER).await?;

        let mut pools = PerCurrency::from_fn(|_| String::new());
        for ticker in crate::model::Ticker::ALL {
            let name = ticker.currency().loan_pool_name;
            *pools.get_mut(ticker) = self.contract_id(name).await?;
        }

        info!("Bound loan manager {}", loan_manager);

        Ok(ContractIds {
            loan_manager,
            pools,
        })
    }

    pub fn loan_manager(&self, contract_id: &str) -> LoanManagerClient<I> {
        LoanManagerClient::new(ContractClient::new(
            self.invoker.clone(),
            self.cli.clone(),
            contract_id,
            &self.account,
        ))
    }
}

pub fn contract_id_var(name: &str) -> String {
    format!("CONTRACT_ID_{}", name.to_uppercase())
}

/// 32 bytes, hex encoded, from the seed and fresh random bytes.
pub fn new_salt(seed: &str) -> String {
    let noise: [u8; 32] = rand::random();
    let noise: String = noise.iter().map(|byte| format!("{:02x}", byte)).collect();

    sha256::digest(format!("{}:{}", seed, noise))
}

pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub async fn read_text_file(path: &Path) -> Result<String, Error> {
    let text = fs::read_to_string(path).await.map_err(|err| {
        Error::ConfigurationError(format!("{}: {}", path.display(), err))
    })?;
    Ok(text.trim().to_owned())
}

pub async fn write_text_file(path: &Path, text: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, text).await?;
    Ok(())
}

/// Stale `.wasm` and `.d` files would otherwise be installed when the
/// build fails.
async fn remove_build_outputs(directory: &Path) -> Result<(), Error> {
    let mut entries = match fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let stale = matches!(
            path.extension().and_then(|extension| extension.to_str()),
            Some("wasm") | Some("d")
        );

        if stale {
            info!("exe: rm -f {}", path.display());
            fs::remove_file(&path).await?;
        }
    }

    Ok(())
}
