use std::convert::Infallible;

use warp::Reply;

use crate::core::server::SharedChatServer;

/// Room, user and shuffle counters as JSON
pub async fn stats_handler(server: SharedChatServer) -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&server.stats().await))
}
