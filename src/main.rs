//! Main entry point for the Ranked Room coordinator
//!
//! Loads configuration, opens the JSON store, starts the health server and
//! connects to the Discord gateway until a shutdown signal arrives.

use anyhow::{Context, Result};
use clap::Parser;
use ranked_room::config::AppConfig;
use ranked_room::discord::{Handler, SerenityPlatform};
use ranked_room::service::AppState;
use ranked_room::store::{JsonFileBackend, Store};
use serenity::all::{Client, GatewayIntents, Http};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Ranked Room - ranked match rooms, ELO and leaderboards for Discord guilds
#[derive(Parser)]
#[command(
    name = "ranked-room",
    version,
    about = "A Discord bot coordinating ranked matches, ELO ratings and leaderboards",
    long_about = "Ranked Room opens private match rooms from a setup panel, lets hosts report \
                 outcomes that feed per-mode ELO tracks with rank tiers and streak overrides, \
                 and keeps one leaderboard panel per mode up to date in a configured channel."
)]
struct Args {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[arg(long, value_name = "PORT", help = "Override health server port")]
    health_port: Option<u16>,

    #[arg(long, value_name = "DIR", help = "Override the data directory")]
    data_dir: Option<PathBuf>,

    #[arg(
        long,
        help = "Validate configuration and persisted state, then exit without connecting"
    )]
    dry_run: bool,

    #[arg(long, help = "Do not register slash commands on startup")]
    skip_command_registration: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

fn display_startup_banner(config: &AppConfig) {
    info!("🏆 Ranked Room");
    info!("   Service: {}", config.service.name);
    info!("   Version: {}", ranked_room::VERSION);
    info!("   Log level: {}", config.service.log_level);
    info!("   Health server: {}", config.health_addr());
    info!("   Data directory: {}", config.storage.data_dir.display());
    info!(
        "   Room deletion delay: {}s",
        config.matches.room_deletion_delay_seconds
    );
    info!("   Leaderboard size: {}", config.leaderboard.size);
    info!(
        "   Register commands: {}",
        config.discord.register_commands
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if args.debug {
        config.service.log_level = "debug".to_string();
    }
    if let Some(port) = args.health_port {
        config.service.health_port = port;
    }
    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if args.skip_command_registration {
        config.discord.register_commands = false;
    }

    ranked_room::config::validate_config(&config)?;
    Ok(config)
}

/// Open the store the way the service would and report what it holds
fn check_persisted_state(config: &AppConfig) -> Result<()> {
    let backend = JsonFileBackend::new(&config.storage.data_dir)
        .context("Failed to open data directory")?;
    let store = Store::load(Arc::new(backend)).context("Failed to load persisted state")?;
    let counts = store.counts()?;
    info!(
        "Persisted state OK: {} guilds, {} active matches, {} players",
        counts.guilds, counts.active_matches, counts.players
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        check_persisted_state(&config)?;
        info!("Dry run completed - exiting without connecting to Discord");
        return Ok(());
    }

    if config.discord.token.trim().is_empty() {
        error!("DISCORD_BOT_TOKEN is not set");
        std::process::exit(1);
    }
    let token = config.discord.token.clone();

    info!("Initializing service components...");
    let platform = Arc::new(SerenityPlatform::new(Arc::new(Http::new(&token))));
    let mut app_state = match AppState::new(config.clone(), platform) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let handler = Handler::new(app_state.router(), config.discord.register_commands);
    let mut client = Client::builder(&token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await
        .context("Failed to create Discord client")?;
    let shard_manager = client.shard_manager.clone();

    let mut client_task = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            error!("Discord client error: {}", e);
        }
    });

    info!("✅ Ranked Room is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        }
        _ = &mut client_task => {
            warn!("Discord client stopped, shutting down");
        }
    }

    shard_manager.shutdown_all().await;
    client_task.abort();

    match tokio::time::timeout(config.shutdown_timeout(), app_state.shutdown()).await {
        Ok(Ok(())) => info!("✅ Graceful shutdown completed successfully"),
        Ok(Err(e)) => warn!("Shutdown finished with errors: {}", e),
        Err(_) => warn!("⚠️  Shutdown timeout exceeded, forcing exit"),
    }

    info!("🛑 Ranked Room stopped");
    Ok(())
}
