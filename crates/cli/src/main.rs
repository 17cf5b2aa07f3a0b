use std::path::PathBuf;

use anyhow::{bail, Context};
use books_kernel::settings::{Settings, CONFIG_DIR_ENV, ENV_VAR_NAME};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "books-cli", version, about = "Operate the books catalog service")]
struct Cli {
    /// Environment overlay to load (local, staging, production)
    #[arg(long, global = true)]
    env: Option<String>,

    /// Directory holding base.toml and the environment overlays
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending schema migrations and exit
    Migrate,
    /// Print the resolved settings
    Config,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        if self.env.is_none() && self.config_dir.is_none() {
            return Settings::load().context("failed to load settings");
        }

        let environment = match &self.env {
            Some(env) => env.clone(),
            None => std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| "local".to_string()),
        };
        let config_dir = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => std::env::var(CONFIG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config")),
        };
        Settings::load_from(&config_dir, &environment)
            .with_context(|| format!("failed to load settings from {}", config_dir.display()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;
    books_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => books_app::run(settings).await,
        Command::Migrate => {
            let storage = books_app::open_storage(&settings).await?;
            let Some(pool) = storage.pool else {
                bail!("the configured backend has no schema to migrate");
            };
            let registry = books_app::build_registry(storage.store);
            let applied = books_app::migrate(&pool, &registry).await?;
            tracing::info!(applied, "migrations applied");
            Ok(())
        }
        Command::Config => {
            println!("{settings:#?}");
            Ok(())
        }
    }
}
