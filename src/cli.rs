use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "storydesk")]
#[command(about = "Story scheduling and publishing service", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $STORYDESK_CONFIG or config/storydesk.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API and the publish worker
    Server(ServerArgs),
    /// Print a draft schedule for a date range as JSON
    Generate(GenerateArgs),
    /// Print the effective configuration as TOML (secrets omitted)
    Config,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// First day, YYYY-MM-DD
    #[arg(long)]
    pub start: String,
    /// Last day, YYYY-MM-DD (inclusive)
    #[arg(long)]
    pub end: String,
}
