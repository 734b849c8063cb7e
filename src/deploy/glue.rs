//! `contracts.conf`, the file that hands deployed contract ids to the
//! server and the command line.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    configuration::{ContractIds, Network},
    error::Error,
};

use super::util::{contract_id_var, write_text_file, LOAN_MANAGER};

pub const CONTRACTS_CONF: &str = "contracts.conf";

pub fn glue_content(network: Network, rpc_url: &str, ids: &ContractIds) -> String {
    let mut lines = vec![
        String::from("# Generated by `laina deploy`, do not edit."),
        format!("SOROBAN_NETWORK={}", network),
        format!("SOROBAN_RPC_URL={}", rpc_url),
        format!("{}={}", contract_id_var(LOAN_MANAGER), ids.loan_manager),
    ];

    for (ticker, contract_id) in ids.pools.iter() {
        let name = ticker.currency().loan_pool_name;
        lines.push(format!("{}={}", contract_id_var(name), contract_id));
    }

    lines.push(String::new());
    lines.join("\n")
}

pub async fn write_glue(
    directory: &Path,
    network: Network,
    rpc_url: &str,
    ids: &ContractIds,
) -> Result<PathBuf, Error> {
    let path = directory.join(CONTRACTS_CONF);
    write_text_file(&path, &glue_content(network, rpc_url, ids)).await?;

    info!("Created {}", path.display());

    Ok(path)
}
