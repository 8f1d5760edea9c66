//! Request handlers for different server endpoints

pub mod stats;
pub mod websocket;

use std::convert::Infallible;

use log::info;
use warp::{Filter, Rejection, Reply};

use crate::constants::WS_PATH;
use crate::core::server::SharedChatServer;

// Re-export the websocket handler
pub use websocket::handle_ws_client;

/// All HTTP and WebSocket routes served by the chat server
pub fn routes(
    server: SharedChatServer,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let ws_route = warp::path(WS_PATH)
        .and(warp::ws())
        .and(with_server(server.clone()))
        .map(|ws: warp::ws::Ws, server: SharedChatServer| {
            info!("New websocket connection");
            ws.on_upgrade(move |socket| handle_ws_client(socket, server))
        });

    let health_route = warp::path("health").map(|| "OK");

    let stats_route = warp::path("stats")
        .and(warp::get())
        .and(with_server(server))
        .and_then(stats::stats_handler);

    ws_route.or(health_route).or(stats_route)
}

// Helper function to include the server state in a request
fn with_server(
    server: SharedChatServer,
) -> impl Filter<Extract = (SharedChatServer,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}
