use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mediasync")]
#[command(about = "Imports media from external storage folders into the catalog", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sync workers and the operator HTTP API
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Configuration file (default: $MEDIASYNC_CONFIG or config/mediasync.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides server.bind_addr
    #[arg(long)]
    pub address: Option<SocketAddr>,
}
