//! Expressway server binary.
//!
//! Boots an application root with the core backends only and serves it
//! until SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use expressway::config::ConfigStore;
use expressway::lifecycle::signals;
use expressway::observability::logging;
use expressway::plugin::{kinds::RoutesEntry, CONFIG_DIR};
use expressway::{Bootstrap, PluginRegistry};

#[derive(Parser)]
#[command(name = "expressway", version, about = "Convention-driven application server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Boot the application and serve it.
    Serve {
        /// Application root.
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Port; falls back to app.port, then 3000.
        #[arg(long)]
        port: Option<u16>,

        /// Emit JSON logs.
        #[arg(long)]
        json_logs: bool,
    },
    /// Print a configuration value by dotted path.
    Config {
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Dotted path such as `app.port`.
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Serve {
            root,
            port,
            json_logs,
        } => {
            logging::init(json_logs)?;
            tracing::info!("expressway v{} starting", env!("CARGO_PKG_VERSION"));

            let registry = PluginRegistry::with_core().routes_entry(RoutesEntry::default());
            let app = Bootstrap::new(root, registry).configure()?.boot().await?;
            let server = app.serve(port).await?;

            signals::forward_to(server.shutdown().clone());
            server.wait().await?;

            tracing::info!("Shutdown complete");
        }
        Command::Config { root, path } => {
            let store = ConfigStore::load(&root.join(CONFIG_DIR))?;
            match store.get(&path) {
                Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
                None => {
                    eprintln!("{path}: not set");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
