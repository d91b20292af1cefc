//! Shop services daemon
//!
//! Runs the demo payment and checkout services, each behind the entropy
//! interceptor so the entropy engine can degrade them.

use clap::{Parser, Subcommand};
use shop_services::error::{ShopError, ShopResult};
use shop_services::{checkout, payment, server, ShopConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shop services CLI
#[derive(Parser)]
#[command(name = "shopd")]
#[command(about = "Demo shop services running under injected entropy", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SHOP_CONFIG")]
    config: Option<String>,

    /// Log level
    #[arg(long, env = "SHOP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "SHOP_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the payment service
    Payment,
    /// Run the checkout service
    Checkout {
        /// Payment service base URL
        #[arg(long, env = "SHOP_PAYMENT_URL")]
        payment_url: Option<String>,
    },
    /// Run both services in one process
    All,
}

#[tokio::main]
async fn main() -> ShopResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
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

    // Load configuration
    let mut config =
        ShopConfig::load(cli.config.as_deref()).map_err(|e| ShopError::Config(e.to_string()))?;

    match cli.command {
        Command::Payment => {
            let router = payment::build(&config.payment)?;
            server::serve("payment", config.payment.listen_addr, router).await
        }
        Command::Checkout { payment_url } => {
            if let Some(url) = payment_url {
                config.checkout.payment_url = url;
            }
            let router = checkout::build(&config.checkout)?;
            server::serve("checkout", config.checkout.listen_addr, router).await
        }
        Command::All => {
            let payment = payment::build(&config.payment)?;
            let checkout = checkout::build(&config.checkout)?;
            tokio::try_join!(
                server::serve("payment", config.payment.listen_addr, payment),
                server::serve("checkout", config.checkout.listen_addr, checkout),
            )?;
            Ok(())
        }
    }
}
