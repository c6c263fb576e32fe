//! mptcpd - Multipath TCP path-manager daemon.

mod config;
mod endpoint;
mod error;
mod idmap;
mod listener;
mod monitor;
mod plugin;
mod policy;
mod supervisor;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use error::Result;
use supervisor::Supervisor;

#[derive(Parser)]
#[command(name = "mptcpd", version, about = "Multipath TCP path-manager daemon")]
struct Cli {
    /// Path to a TOML configuration file. Missing keys fall back to
    /// built-in defaults.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Plugin directory override.
    #[arg(long)]
    plugin_dir: Option<String>,

    /// Name of the plugin to use when a connection carries no explicit hint.
    #[arg(long)]
    default_plugin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::Config::from_file(path)?,
        None => config::Config::default(),
    };
    if let Some(plugin_dir) = cli.plugin_dir {
        cfg.plugin_dir = plugin_dir;
    }
    if let Some(default_plugin) = cli.default_plugin {
        cfg.default_plugin = Some(default_plugin);
    }

    info!(plugin_dir = %cfg.plugin_dir, "starting mptcp path manager");

    let mut supervisor = Supervisor::start(cfg).await?;
    supervisor.run().await
}
