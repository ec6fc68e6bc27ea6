//! Hibiki chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hibiki-server -- --port 8080 --broker memory
//! ```

use clap::Parser;
use hibiki_server::ServerConfig;
use hibiki_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = hibiki_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
