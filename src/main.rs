mod cli;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use storydesk::config::Config;
use storydesk::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    init_tracing(&config.telemetry);

    match cli.command {
        Commands::Server(args) => server::run(config, args.address).await?,
        Commands::Generate(args) => server::print_schedule(&config, &args.start, &args.end)?,
        Commands::Config => println!("{}", toml::to_string_pretty(&config)?),
    }

    Ok(())
}
