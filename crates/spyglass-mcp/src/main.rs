//! Spyglass MCP Server - Main entry point

use spyglass_engine::EngineConfig;
use spyglass_mcp::McpServer;
use std::env;
use tracing::Level;
use tracing_subscriber;

fn main() {
    // Initialize tracing (log to stderr; stdout carries the protocol)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::INFO)
        .init();

    // Load engine config from SPYGLASS_CONFIG, or run with defaults
    // (every source unconfigured; operations degrade but answer)
    let config = match env::var("SPYGLASS_CONFIG") {
        Ok(path) => match EngineConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        Err(_) => {
            eprintln!("Warning: SPYGLASS_CONFIG not set, using default configuration");
            EngineConfig::default()
        }
    };

    let mut server = match McpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to create MCP server: {}", e);
            std::process::exit(1);
        }
    };

    // Run server (blocks until stdin closes)
    if let Err(e) = server.run() {
        eprintln!("MCP server error: {}", e);
        std::process::exit(1);
    }
}
