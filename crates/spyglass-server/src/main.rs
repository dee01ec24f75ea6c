//! Spyglass Server CLI
//!
//! Starts the HTTP server exposing the Spyglass read operations.

use anyhow::Context;
use spyglass_server::{start_server, ServerConfig};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
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
        ServerConfig::from_file(config_path)
            .with_context(|| format!("loading config from {}", config_path))?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using default test configuration");
        eprintln!("Usage: spyglass-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default_test_config()
    };

    start_server(config).await.context("server terminated")?;

    Ok(())
}

fn print_help() {
    println!("Spyglass Server - Read-Only Observability Facade");
    println!();
    println!("USAGE:");
    println!("    spyglass-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("EXAMPLE:");
    println!("    spyglass-server --config config/spyglass.toml");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address: IP address to bind (e.g., '127.0.0.1')");
    println!("    - bind_port: Port number (e.g., 7400)");
    println!("    - api_key: API key clients must present");
    println!("    - [engine]: source endpoints and bounds (mirror_url,");
    println!("      component_url, depot_url, global_ledger_url, limits, TTLs)");
    println!();
}
