//! Feed definitions and subscription configuration.

use std::time::Duration;

use super::{event::LiveEvent, item::FeedItem};

/// Default number of items kept by the alerts and IoT feeds.
pub const DEFAULT_CAPACITY: usize = 500;

/// Default period between keep-alive pings.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// A backend path plus query parameters, relative to a REST or stream base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEndpoint {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl FeedEndpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Add a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter when `value` is present.
    pub fn with_optional_param(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }
}

/// Per-subscription tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// Maximum number of retained items; older items are evicted past it
    pub capacity: usize,
    /// Period of the snapshot re-fetch, if any
    pub refetch_interval: Option<Duration>,
    /// Period of the outbound `ping` while the channel is open
    pub keepalive_interval: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            refetch_interval: None,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }
}

/// One kind of live feed: where its snapshot and stream live and how its
/// stream frames decode.
///
/// When a feed is scoped (e.g. to one sensor) both endpoints must carry the
/// scope.
pub trait Feed: Send + Sync + 'static {
    type Item: FeedItem;

    /// Short name used in logs, e.g. `alerts`
    fn name(&self) -> &'static str;

    /// REST endpoint returning the full current collection
    fn snapshot_endpoint(&self) -> FeedEndpoint;

    /// WebSocket endpoint streaming live events
    fn stream_endpoint(&self) -> FeedEndpoint;

    /// Decode one inbound text frame. Unrecognized frames yield `None`.
    fn decode(&self, text: &str) -> Option<LiveEvent<Self::Item>>;

    /// Configuration used when the host does not supply one
    fn default_config(&self) -> SubscriptionConfig {
        SubscriptionConfig::default()
    }
}
