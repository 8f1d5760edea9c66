use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use triad_chat::config::ServerConfig;
use triad_chat::core::ChatServer;
use triad_chat::handlers::routes;

#[tokio::main]
async fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, shuffle every {:?}",
        config.host, config.port, config.shuffle_interval
    );

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    let server = Arc::new(ChatServer::new(config));
    server.clone().start_shuffle_task();

    info!("Starting Triad Chat server on {}", addr);
    warp::serve(routes(server)).run(addr).await;
}
