use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cartage",
    about = "Cartage — batched archive pulls into content-addressed storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the Cartage service
    Serve(ServeArgs),
    /// Pull a single archive now and print its canonical location
    Pull(PullArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address (overrides CARTAGE_BIND_ADDR)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Data directory for durable state (overrides CARTAGE_DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct PullArgs {
    /// Absolute URL of the archive to pull
    pub url: String,
}
