use std::path::PathBuf;

use tracing::info;

use crate::{
    configuration::ContractIds,
    error::Error,
    model::Ticker,
    provider::Invoker,
};

use super::{
    glue::write_glue,
    util::{new_salt, path_string, write_text_file, Deployer, LOAN_MANAGER, LOAN_POOL},
};

/// Liquidation threshold of every new pool, scaled by 10^7.
pub const LIQUIDATION_THRESHOLD: i64 = 8_000_000;

/// Deploys the loan manager and one pool per currency from scratch.
pub async fn initialize<I: Invoker>(
    deployer: &Deployer<I>,
) -> Result<(ContractIds, PathBuf), Error> {
    info!("Initializing contracts on {}", deployer.network);

    deployer.load_account().await?;
    deployer.fund_account().await?;
    deployer.build_contracts().await?;
    deployer.install_contracts().await?;

    let manager_id = deploy_loan_manager(deployer).await?;
    deploy_loan_pools(deployer, &manager_id).await?;

    let ids = deployer.bind_contracts().await?;
    let glue = write_glue(
        &deployer.output_dir,
        deployer.network,
        &deployer.cli.rpc_url,
        &ids,
    )
    .await?;

    info!("Initialization successful!");

    Ok((ids, glue))
}

async fn deploy_loan_manager<I: Invoker>(deployer: &Deployer<I>) -> Result<String, Error> {
    let manager_id = deployer.deploy(LOAN_MANAGER).await?;

    deployer
        .loan_manager(&manager_id)
        .initialize(&deployer.account)
        .await?;

    Ok(manager_id)
}

/// The loan manager is the pool factory.
async fn deploy_loan_pools<I: Invoker>(
    deployer: &Deployer<I>,
    manager_id: &str,
) -> Result<(), Error> {
    let wasm_hash = deployer.read_wasm_hash(LOAN_POOL).await?;
    let manager = deployer.loan_manager(manager_id);

    for ticker in Ticker::ALL {
        let currency = ticker.currency();
        let pool_id = manager
            .deploy_pool(
                &deployer.account,
                &wasm_hash,
                &new_salt(ticker.as_str()),
                currency.token_contract_address,
                ticker,
                LIQUIDATION_THRESHOLD,
            )
            .await?;

        let path = deployer.contract_id_path(currency.loan_pool_name);
        write_text_file(&path, &pool_id).await?;

        info!("Deployed {} pool at {} ({})", ticker, pool_id, path_string(&path));
    }

    Ok(())
}
