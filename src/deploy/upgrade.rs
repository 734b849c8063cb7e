use std::path::PathBuf;

use tracing::info;

use crate::{configuration::ContractIds, error::Error, provider::Invoker};

use super::{
    glue::write_glue,
    util::{Deployer, LOAN_MANAGER, LOAN_POOL},
};

/// Installs fresh wasm and upgrades the loan manager, which upgrades its
/// pools in the same call.
pub async fn upgrade<I: Invoker>(
    deployer: &Deployer<I>,
) -> Result<(ContractIds, PathBuf), Error> {
    info!("Upgrading contracts on {}", deployer.network);

    deployer.load_account().await?;
    deployer.build_contracts().await?;
    deployer.install_contracts().await?;

    let manager_hash = deployer.read_wasm_hash(LOAN_MANAGER).await?;
    let pool_hash = deployer.read_wasm_hash(LOAN_POOL).await?;
    let manager_id = deployer.contract_id(LOAN_MANAGER).await?;

    deployer
        .loan_manager(&manager_id)
        .upgrade(&deployer.account, &manager_hash, &pool_hash)
        .await?;

    let ids = deployer.bind_contracts().await?;
    let glue = write_glue(
        &deployer.output_dir,
        deployer.network,
        &deployer.cli.rpc_url,
        &ids,
    )
    .await?;

    info!("Upgrade successful!");

    Ok((ids, glue))
}
