use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carousel::controller::SimulatedController;
use carousel::models::{keys, RemoteSettings, RotationConfig, RotationState};
use carousel::scheduler::RotationScheduler;
use carousel::store::{self, JsonFileStore, StateStore};

#[derive(Parser)]
#[command(
    name = "carousel",
    version,
    about = "Unattended page rotation for always-on displays",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rotation against a simulated display until interrupted
    Run {
        /// State store file path
        #[arg(short, long, default_value = "carousel-state.json")]
        store: String,
    },

    /// Validate a rotation configuration file
    Validate {
        /// Configuration JSON file path
        #[arg(short, long)]
        config: String,
    },

    /// Write configuration into a state store
    Seed {
        /// State store file path
        #[arg(short, long, default_value = "carousel-state.json")]
        store: String,

        /// Local configuration JSON file path
        #[arg(short, long)]
        config: Option<String>,

        /// Remote configuration endpoint (switches to remote mode)
        #[arg(long)]
        remote_url: Option<String>,

        /// Remote re-fetch interval in minutes (0 fetches once on start)
        #[arg(long, default_value = "0")]
        poll_minutes: i64,
    },

    /// Show the persisted rotation state
    State {
        /// State store file path
        #[arg(short, long, default_value = "carousel-state.json")]
        store: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Run { store } => {
            tracing::info!(store = %store, "Starting run command");
            run(store).await?;
        }

        Commands::Validate { config } => {
            tracing::info!(config = %config, "Starting validate command");
            validate(config).await?;
        }

        Commands::Seed {
            store,
            config,
            remote_url,
            poll_minutes,
        } => {
            tracing::info!(
                store = %store,
                config = ?config,
                remote_url = ?remote_url,
                poll_minutes = %poll_minutes,
                "Starting seed command"
            );
            seed(store, config, remote_url, poll_minutes).await?;
        }

        Commands::State { store } => {
            state(store).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("carousel=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("carousel=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Drive the rotation with a simulated controller. Useful for exercising a
/// seeded configuration end to end without a real display host.
async fn run(store_path: String) -> Result<()> {
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(&store_path));
    let (controller, events) = SimulatedController::new();
    let scheduler = RotationScheduler::spawn(controller, store, events);

    scheduler
        .start()
        .await
        .context("failed to start rotation")?;
    tracing::info!("rotation running; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutting down");
    scheduler.stop().await.context("failed to stop rotation")?;
    Ok(())
}

async fn validate(config_path: String) -> Result<()> {
    let config = read_config(&config_path).await?;

    match config.validate() {
        Ok(()) => {
            println!(
                "{}: ok ({} pages)",
                config_path,
                config.pages.len()
            );
            Ok(())
        }
        Err(e) => {
            for error in &e.errors {
                eprintln!("  {error}");
            }
            bail!("{config_path}: invalid configuration");
        }
    }
}

async fn seed(
    store_path: String,
    config_path: Option<String>,
    remote_url: Option<String>,
    poll_minutes: i64,
) -> Result<()> {
    let store = JsonFileStore::new(&store_path);

    if let Some(url) = remote_url {
        let settings = RemoteSettings {
            config_url: url,
            config_reload_interval_minutes: poll_minutes,
        };
        store::set_typed(&store, keys::USE_REMOTE_CONFIG, &true).await?;
        store::set_typed(&store, keys::REMOTE_SETTINGS, &settings).await?;

        // An optional local file becomes the cached remote copy, so the
        // display can come up before its first successful fetch.
        if let Some(path) = config_path {
            let config = read_config(&path).await?;
            config.validate()?;
            store::set_typed(&store, keys::REMOTE_CONFIG, &config).await?;
        }
        println!("{store_path}: seeded for remote configuration");
    } else {
        let path = config_path.context("--config is required without --remote-url")?;
        let config = read_config(&path).await?;
        config.validate()?;
        store::set_typed(&store, keys::USE_REMOTE_CONFIG, &false).await?;
        store::set_typed(&store, keys::LOCAL_CONFIG, &config).await?;
        println!(
            "{}: seeded local configuration with {} pages",
            store_path,
            config.pages.len()
        );
    }
    Ok(())
}

async fn state(store_path: String) -> Result<()> {
    let store = JsonFileStore::new(&store_path);
    let state: RotationState = store::get_typed(&store, keys::ROTATION_STATE)
        .await?
        .unwrap_or_default();

    println!("rotating:  {}", state.is_rotating);
    println!(
        "resources: {}",
        state
            .resource_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

async fn read_config(path: &str) -> Result<RotationConfig> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {path}"))
}
