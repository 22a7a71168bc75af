//! Domain layer: feed items, live events, the per-feed state machine and the
//! ports the synchronizer needs from the outside world.

pub mod error;
pub mod event;
pub mod feed;
pub mod item;
pub mod port;
pub mod state;

pub use error::{ChannelError, FetchError};
pub use event::LiveEvent;
pub use feed::{Feed, FeedEndpoint, SubscriptionConfig};
pub use item::{AlertItem, FeedItem, HeatPoint, IotReading, IotValue};
pub use port::{ChannelEvent, ChannelFactory, FeedChannel, SnapshotFetcher};
pub use state::{ConnectionPhase, FeedState};
