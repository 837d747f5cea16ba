//! Command-line entry point for the weather station bridge.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wxbridge_core::BridgeConfig;

/// Receives PWS uploads from a weather station and publishes them to Home Assistant.
#[derive(Parser, Debug)]
#[command(name = "wxbridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind to.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to.
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the effective configuration (secrets masked) and exit.
    #[arg(long)]
    check_config: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;

    if args.check_config {
        let rendered = toml::to_string_pretty(&config.redacted())
            .context("Failed to render configuration")?;
        println!("{}", rendered);
        return Ok(());
    }

    log_config_summary(&config);
    wxbridge_api::run(&config).await
}

fn init_logging(verbose: bool) {
    // JSON format for container environments
    let json_logging = std::env::var("WXBRIDGE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_level = if verbose {
        "wxbridge=debug"
    } else {
        "wxbridge=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(default_level).add_directive(tracing::Level::WARN.into())
    });

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .init();
    }
}

/// File, then environment, then command-line flags.
fn load_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = BridgeConfig::load(args.config.as_deref())
        .with_context(|| match &args.config {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to load configuration".to_string(),
        })?;

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn log_config_summary(config: &BridgeConfig) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.server.bind_addr(),
        backend = ?config.backend,
        units = ?config.units,
        timezone = %config.timezone,
        forward = config.forward.enabled,
        "Starting wxbridge"
    );
}
