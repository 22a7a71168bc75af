//! Live-feed synchronizer.
//!
//! One [`usecase::Subscription`] per feed merges a REST snapshot with the
//! feed's WebSocket push stream into a bounded, most-recent-first
//! [`domain::FeedState`].

// layers
pub mod domain;
pub mod infrastructure;
pub mod usecase;

use geolive_shared::session::Session;

pub use domain::{
    AlertItem, ConnectionPhase, Feed, FeedEndpoint, FeedItem, FeedState, HeatPoint, IotReading,
    IotValue, LiveEvent, SubscriptionConfig,
};
pub use infrastructure::feeds::{AlertsFeed, HeatmapFeed, IotFeed};
pub use usecase::{FeedPorts, Subscription};

/// Subscribe to `feed` against the backend of `session`, with the feed's
/// default configuration unless `config` is given.
///
/// Must be called inside a tokio runtime.
pub fn subscribe<F: Feed>(
    session: &Session,
    feed: F,
    config: Option<SubscriptionConfig>,
) -> Subscription<F::Item> {
    let ports = infrastructure::ports_for(session, &feed);
    let config = config.unwrap_or_else(|| feed.default_config());
    Subscription::start(feed, config, ports)
}
