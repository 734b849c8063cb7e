use std::sync::Arc;

use clap::Parser;
use tracing::{error, Level};

use laina::{
    cli::{self, Cli, Commands},
    configuration::{AppState, State},
    error::Error,
    handler::pool_state::pool_report_task,
    provider::Shell,
    server,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let result = app_main().await;

    if let Err(err) = &result {
        error!("{}", err);
    }

    result
}

fn max_level() -> Level {
    #[cfg(debug_assertions)]
    {
        Level::INFO
    }

    #[cfg(not(debug_assertions))]
    {
        Level::INFO
    }
}

async fn app_main() -> Result<(), Error> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level(max_level())
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Serve) => serve().await,
        Some(command) => cli::run(command).await,
    }
}

async fn serve() -> Result<(), Error> {
    let config = match cli::init_config() {
        Ok(config) => config,
        Err(e) => return Err(Error::ConfigurationError(e.to_string())),
    };

    let invoker = Arc::new(Shell::new(config.timeout));
    let state = State::new(config, invoker)?;
    let app_state = AppState::new(state);
    app_state.pools.start();

    let (_, _) = tokio::try_join!(
        server::server_task(&app_state),
        pool_report_task(app_state.clone()),
    )?;

    Ok(())
}
