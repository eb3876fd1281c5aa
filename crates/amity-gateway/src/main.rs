//! Amity Gateway CLI
//!
//! Starts the Gateway HTTP server for the friend-relationship API.

use amity_gateway::{config::GatewayConfig, start_server};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        let config_path = &args[2];
        GatewayConfig::from_file(config_path)?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        tracing::warn!("No config file specified, using default test configuration");
        eprintln!("Usage: amity-gateway --config <path-to-config.toml>");
        eprintln!();
        GatewayConfig::default_test_config()
    };

    start_server(config).await?;

    Ok(())
}

fn print_help() {
    println!("Amity Gateway - Friend relationship API");
    println!();
    println!("USAGE:");
    println!("    amity-gateway --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address: IP address to bind (e.g., '127.0.0.1')");
    println!("    - bind_port: Port number (e.g., 8080)");
    println!("    - jwt_secret: Secret shared with the identity provider");
    println!("    - token_expiry_secs: Expiry of locally issued tokens (default: 3600)");
    println!("    - database_path: SQLite file (default: 'amity.db')");
    println!("    - [rate_limit] max_requests / window_secs (default: 20 per 60s)");
    println!("    - [rate_limit] max_tracked_users (default: 10000)");
    println!();
    println!("    Log verbosity follows RUST_LOG (default: info).");
}
