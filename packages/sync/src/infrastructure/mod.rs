//! Infrastructure layer: HTTP snapshot fetching, WebSocket channels, wire
//! DTOs and the concrete feed definitions.

pub mod dto;
pub mod feeds;
pub mod http;
pub mod websocket;

use std::sync::Arc;

use geolive_shared::{session::Session, time::SystemClock};

use crate::{domain::Feed, usecase::FeedPorts};

pub use http::HttpSnapshotFetcher;
pub use websocket::{WebSocketChannel, WebSocketChannelFactory};

/// Production ports for `feed` under `session`: reqwest for snapshots,
/// tokio-tungstenite for the stream, the system clock for timestamps.
pub fn ports_for<F: Feed>(session: &Session, feed: &F) -> FeedPorts<F::Item> {
    FeedPorts {
        fetcher: Arc::new(HttpSnapshotFetcher::new(
            session.clone(),
            feed.snapshot_endpoint(),
        )),
        channels: Arc::new(WebSocketChannelFactory::from_session(session)),
        clock: Arc::new(SystemClock),
    }
}
