//! Use case layer: running a live subscription.

pub mod subscribe;

pub use subscribe::{FeedPorts, Subscription};
