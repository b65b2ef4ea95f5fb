mod cli;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use modset::config::Config;
use modset::observability;
use modset::registry::ModuleType;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();
    observability::init_logging(cli.log.as_deref());

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let assignments = config.build_assignments()?;

    match cli.command {
        Commands::Dump(args) => {
            let json = match args.kind {
                Some(ModuleType::Handler) => serde_json::to_string_pretty(&assignments.handlers)?,
                Some(ModuleType::Output) => serde_json::to_string_pretty(&assignments.outputs)?,
                None => serde_json::to_string_pretty(&assignments)?,
            };
            println!("{json}");
        }
        Commands::Plan(args) => {
            let plan = assignments.plan(&args.page, args.authenticated);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Serve(args) => {
            let address = args.address.unwrap_or(config.server.bind_addr);
            server::run(address, assignments).await?
        }
    }

    Ok(())
}
