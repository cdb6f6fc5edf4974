use anyhow::Context;
use cartage_server::{AppState, CartageServer, ServiceConfig};

use crate::cli::{Cli, Command, PullArgs, ServeArgs};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Pull(args) => pull(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = ServiceConfig::from_env().context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = Some(data_dir);
    }

    CartageServer::new(config)
        .serve()
        .await
        .context("running server")
}

async fn pull(args: PullArgs) -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("loading configuration")?;
    let state = AppState::from_config(&config)
        .await
        .context("wiring pipeline")?;

    let location = state.worker.pull(&args.url).await?;
    println!("{location}");
    Ok(())
}
