use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use modset::registry::ModuleType;

#[derive(Parser, Debug)]
#[command(name = "modset")]
#[command(about = "Page module registry", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $MODSET_CONFIG or config/modset.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the frozen module tables as JSON
    Dump(DumpArgs),
    /// Print the modules one request would run
    Plan(PlanArgs),
    /// Serve the frozen tables over HTTP
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct DumpArgs {
    /// Only print one registry
    #[arg(long)]
    pub kind: Option<ModuleType>,
}

#[derive(clap::Args, Debug)]
pub struct PlanArgs {
    /// Page identifier
    #[arg(long)]
    pub page: String,

    /// Treat the request as logged in
    #[arg(long)]
    pub authenticated: bool,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}
