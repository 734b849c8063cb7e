//! Contract deployment: fund, build, install, deploy, bind and write the
//! `contracts.conf` glue. Every step shells out to `stellar` or `make`.

pub use self::{
    glue::{glue_content, write_glue, CONTRACTS_CONF},
    initialize::{initialize, LIQUIDATION_THRESHOLD},
    upgrade::upgrade,
    util::Deployer,
};

pub mod glue;
pub mod initialize;
pub mod upgrade;
pub mod util;
