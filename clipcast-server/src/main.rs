//! Clipcast API server binary.
//!
//! Loads configuration (`.env`, optional TOML file, environment), picks the
//! PostgreSQL store when `DATABASE_URL` is set and the in-memory store
//! otherwise, and serves the API until Ctrl-C.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use clipcast_core::store::{DocumentStore, MemoryStore, PostgresDocumentStore};
use clipcast_server::{
    create_app,
    infra::{
        app_state::AppState,
        config::{Config, ConfigLoad, ConfigLoader},
    },
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "clipcast-server")]
#[command(about = "Social video platform API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, env = "CLIPCAST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    if let Some(Command::Db(DbCommand::Migrate)) = cli.command {
        return run_db_migrate(&config).await;
    }

    run_server(config).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Arc<Config>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    Ok(Arc::new(config))
}

async fn connect_postgres(config: &Config) -> anyhow::Result<Option<PostgresDocumentStore>> {
    let Some(url) = config.database.url.as_deref() else {
        return Ok(None);
    };
    let store = PostgresDocumentStore::connect(url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    store.migrate().await.context("database migration failed")?;
    Ok(Some(store))
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    if connect_postgres(config).await?.is_none() {
        anyhow::bail!("DATABASE_URL must be set to run migrations");
    }
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = match connect_postgres(&config).await? {
        Some(postgres) => {
            info!("using PostgreSQL document store");
            Arc::new(postgres)
        }
        None => Arc::new(MemoryStore::new()),
    };

    let state = AppState::new(Arc::clone(&config), store)?;
    let app = create_app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, dev_mode = config.dev_mode, "Clipcast server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
