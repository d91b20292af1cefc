//! Entropy Engine daemon
//!
//! The control plane of the entropy harness:
//! - REST API for setting, reading and resetting entropy per service
//! - Background scenario runs of timed fault-injection steps
//! - Container control for scenario and direct use

use clap::Parser;
use entropy_engine::error::{EngineError, EngineResult};
use entropy_engine::{EngineConfig, Server};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Entropy Engine CLI
#[derive(Parser)]
#[command(name = "entropyd")]
#[command(about = "Entropy Engine - chaos control plane", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ENTROPY_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "ENTROPY_LISTEN_ADDR")]
    listen: Option<String>,

    /// Services definition file
    #[arg(long, env = "ENTROPY_SERVICES_FILE")]
    services: Option<PathBuf>,

    /// Scenario definition directory
    #[arg(long, env = "ENTROPY_SCENARIOS_DIR")]
    scenarios: Option<PathBuf>,

    /// Log level, overriding `logging.level`
    #[arg(long, env = "ENTROPY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging, overriding `logging.json`
    #[arg(long, env = "ENTROPY_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = EngineConfig::load(cli.config.as_deref())
        .map_err(|e| EngineError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| EngineError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(services) = cli.services {
        config.definitions.services_file = services;
    }
    if let Some(scenarios) = cli.scenarios {
        config.definitions.scenarios_dir = scenarios;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Print startup banner
    println!(
        r#"
  _____ _   _ _____ ____   ___  ______   __
 | ____| \ | |_   _|  _ \ / _ \|  _ \ \ / /
 |  _| |  \| | | | | |_) | | | | |_) \ V /
 | |___| |\  | | | |  _ <| |_| |  __/ | |
 |_____|_| \_| |_| |_| \_\\___/|_|    |_|

  Entropy Engine - chaos control plane
  Version: {}
  Services: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.definitions.services_file.display(),
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config)?;
    server.run().await
}
