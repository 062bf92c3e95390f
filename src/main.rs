use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use once_cell::sync::Lazy;
use rackgate::config::{self, GatewayConfig};
use rackgate::handlers::HandlerRegistry;
use rackgate::policy;
use rackgate::server::{self, AppState};
use rackgate_auth::prelude::{generate_salt, hash_password_with, DEFAULT_HASH_ITERATIONS};
use rackgate_interceptors::prelude::InMemoryDirectory;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static LONG_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{} (git {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_DATE")
    )
});

/// RackGate - policy-enforcing API gateway for rack orchestration backends
#[derive(Parser)]
#[command(author, version, long_version = LONG_VERSION.as_str(), about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override a configuration key, e.g. `--set auth.enabled=false`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Log level; defaults to `logging.level` from the configuration
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway
    Serve {
        /// Listen address; overrides `server.bind`
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Load an API document and print the operations and privileges it declares
    CheckSpec {
        /// API document; defaults to `api_spec.path`
        file: Option<PathBuf>,

        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Produce the salt and hash for a local user entry
    HashPassword {
        password: String,

        /// Reuse an existing salt instead of generating one
        #[arg(long)]
        salt: Option<String>,

        /// PBKDF2 iterations; must match `auth.hash_iterations`
        #[arg(long, default_value_t = DEFAULT_HASH_ITERATIONS)]
        iterations: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::HashPassword {
        password,
        salt,
        iterations,
    } = &cli.command
    {
        let salt = salt.clone().unwrap_or_else(generate_salt);
        println!("salt: {salt}");
        println!(
            "password_hash: {}",
            hash_password_with(&salt, password, *iterations)
        );
        return Ok(());
    }

    let (mut config, _snapshot) = config::load(cli.config.as_deref(), &cli.overrides)
        .await
        .context("Failed to load configuration")?;
    let level = config
        .apply_log_level(cli.log_level.as_deref())
        .to_string();
    init_logging(&level, cli.log_format)?;

    match cli.command {
        Commands::Serve { bind } => cmd_serve(config, bind).await,
        Commands::CheckSpec { file, format } => cmd_check_spec(&config, file, format).await,
        Commands::HashPassword { .. } => Ok(()),
    }
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let level: tracing::Level = level.parse().context("Invalid log level")?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
    Ok(())
}

async fn cmd_serve(config: GatewayConfig, bind: Option<SocketAddr>) -> Result<()> {
    let addr = match bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid server.bind {}", config.server.bind))?,
    };
    info!(version = %LONG_VERSION.as_str(), "starting rackgate");

    let spec_path = policy::resolve_spec_path(None, &config.api_spec.path);
    let table = policy::load_operation_table(&spec_path, &config.server.base_path)
        .await
        .with_context(|| format!("Failed to load API document {}", spec_path.display()))?;
    let handlers = HandlerRegistry::new();
    if handlers.is_empty() {
        tracing::warn!("no operation handlers registered; operations will answer 501");
    }
    let state = AppState::build(&config, table, handlers, Arc::new(InMemoryDirectory::new()))
        .context("Failed to assemble request pipeline")?;

    server::serve(state, addr).await?;
    info!("rackgate stopped");
    Ok(())
}

async fn cmd_check_spec(
    config: &GatewayConfig,
    file: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let path = policy::resolve_spec_path(file.as_deref(), &config.api_spec.path);
    let table = policy::load_operation_table(&path, &config.server.base_path)
        .await
        .with_context(|| format!("Invalid API document {}", path.display()))?;
    let summary = policy::summarize(&table);
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(&summary)?,
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
    };
    println!("{rendered}");
    Ok(())
}
