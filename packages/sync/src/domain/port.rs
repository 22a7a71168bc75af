//! Ports the synchronizer depends on.
//!
//! The use case layer only sees these traits; the infrastructure layer
//! provides the HTTP and WebSocket implementations (dependency inversion).

use async_trait::async_trait;

use super::{
    error::{ChannelError, FetchError},
    feed::FeedEndpoint,
};

/// Source of a feed's full current collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotFetcher<T: Send + Sync + 'static>: Send + Sync {
    /// Fetch the collection, most recent first.
    async fn fetch(&self) -> Result<Vec<T>, FetchError>;
}

/// Something that happened on an open channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A text frame
    Text(String),
    /// The peer closed the connection
    Closed,
    /// The connection failed
    Error(String),
}

/// An open, message-oriented duplex channel.
#[async_trait]
pub trait FeedChannel: Send {
    /// Wait for the next event. `None` means the stream ended.
    async fn recv(&mut self) -> Option<ChannelEvent>;

    /// Send a text frame.
    async fn send(&mut self, text: &str) -> Result<(), ChannelError>;

    /// Close the channel.
    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// Opens channels to stream endpoints.
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    /// Open a channel. Resolving `Ok` is the channel's open notification.
    async fn open(&self, endpoint: &FeedEndpoint) -> Result<Box<dyn FeedChannel>, ChannelError>;
}
