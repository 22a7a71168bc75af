//! Subscribe use case
//!
//! ## 責務
//!
//! - Fetch the feed's snapshot and open its stream at the same time
//! - Apply snapshots and live events to one [`FeedState`] in arrival order
//! - Send a keep-alive `ping` while the stream is open
//! - Re-fetch the snapshot periodically when configured
//! - Stop everything on unsubscribe without touching the state again
//!
//! Each subscription runs as one spawned task, so its handlers never run
//! concurrently. The state is published through a `watch` channel.

use std::{
    future::pending,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures_util::future::BoxFuture;
use geolive_shared::time::Clock;
use tokio::{
    sync::watch,
    task::{JoinHandle, JoinSet},
    time::{Instant, Interval, MissedTickBehavior, interval_at},
};

use crate::domain::{
    ChannelError, ChannelEvent, ChannelFactory, Feed, FeedChannel, FeedItem, FeedState,
    FetchError, SnapshotFetcher, SubscriptionConfig,
};

/// Outbound keep-alive frame.
pub const KEEPALIVE_FRAME: &str = "ping";

/// The outside-world dependencies of one subscription.
pub struct FeedPorts<T> {
    pub fetcher: Arc<dyn SnapshotFetcher<T>>,
    pub channels: Arc<dyn ChannelFactory>,
    pub clock: Arc<dyn Clock>,
}

impl<T> Clone for FeedPorts<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            channels: self.channels.clone(),
            clock: self.clock.clone(),
        }
    }
}

/// Publishes state changes unless the subscription was cancelled.
///
/// The cancelled check and the mutation both run under the watch channel's
/// write lock, so no update can land after [`FeedPublisher::cancel`] returns.
struct FeedPublisher<T> {
    tx: watch::Sender<FeedState<T>>,
    cancelled: AtomicBool,
}

impl<T> FeedPublisher<T> {
    fn new(state: FeedState<T>) -> Self {
        Self {
            tx: watch::Sender::new(state),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Apply `f` and notify receivers when it reports a change.
    fn update(&self, f: impl FnOnce(&mut FeedState<T>) -> bool) -> bool {
        self.tx
            .send_if_modified(|state| !self.cancelled.load(Ordering::Acquire) && f(state))
    }

    /// Returns `true` only for the call that actually cancelled.
    fn cancel(&self) -> bool {
        let mut first = false;
        self.tx.send_if_modified(|_| {
            first = !self.cancelled.swap(true, Ordering::AcqRel);
            false
        });
        first
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A running subscription to one feed.
///
/// Created with [`Subscription::start`], which must be called inside a tokio
/// runtime. Dropping the subscription unsubscribes.
pub struct Subscription<T> {
    name: &'static str,
    publisher: Arc<FeedPublisher<T>>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl<T: FeedItem> Subscription<T> {
    /// Start synchronizing `feed`: the first snapshot fetch and the stream
    /// open are issued immediately.
    pub fn start<F>(feed: F, config: SubscriptionConfig, ports: FeedPorts<T>) -> Self
    where
        F: Feed<Item = T>,
    {
        let name = feed.name();
        let publisher = Arc::new(FeedPublisher::new(FeedState::new(config.capacity)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tracing::info!("Subscribing to '{}' (capacity {})", name, config.capacity);
        let task = tokio::spawn(run_subscription(
            feed,
            config,
            ports,
            publisher.clone(),
            shutdown_rx,
        ));

        Self {
            name,
            publisher,
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Start with the feed's own default configuration.
    pub fn start_default<F>(feed: F, ports: FeedPorts<T>) -> Self
    where
        F: Feed<Item = T>,
    {
        let config = feed.default_config();
        Self::start(feed, config, ports)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A receiver notified on every state change
    pub fn state(&self) -> watch::Receiver<FeedState<T>> {
        self.publisher.tx.subscribe()
    }

    /// A copy of the current state
    pub fn snapshot(&self) -> FeedState<T> {
        self.publisher.tx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.publisher.tx.borrow().is_connected()
    }

    pub fn is_cancelled(&self) -> bool {
        self.publisher.is_cancelled()
    }

    /// Stop the subscription. Takes effect immediately: the state is never
    /// updated again, in-flight fetches are aborted and the stream is closed
    /// by the background task. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if self.publisher.cancel() {
            tracing::info!("Unsubscribing from '{}'", self.name);
        }
        let _ = self.shutdown_tx.send(true);
    }

    /// Unsubscribe and wait for the background task to finish closing.
    pub async fn shutdown(mut self) {
        self.unsubscribe();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!("Subscription task for '{}' failed: {}", self.name, e);
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.publisher.cancel();
        let _ = self.shutdown_tx.send(true);
    }
}

type OpenFuture = BoxFuture<'static, Result<Box<dyn FeedChannel>, ChannelError>>;
type FetchSet<T> = JoinSet<Result<Vec<T>, FetchError>>;

async fn run_subscription<F: Feed>(
    feed: F,
    config: SubscriptionConfig,
    ports: FeedPorts<F::Item>,
    publisher: Arc<FeedPublisher<F::Item>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let name = feed.name();
    if *shutdown_rx.borrow_and_update() {
        return;
    }

    let mut fetches: FetchSet<F::Item> = JoinSet::new();
    spawn_fetch(&mut fetches, &ports.fetcher);

    publisher.update(|state| state.begin_connect());
    let endpoint = feed.stream_endpoint();
    let channels = ports.channels.clone();
    let mut connecting: Option<OpenFuture> =
        Some(Box::pin(async move { channels.open(&endpoint).await }));
    let mut channel: Option<Box<dyn FeedChannel>> = None;

    let mut keepalive = periodic(config.keepalive_interval);
    let mut refetch = config.refetch_interval.map(periodic);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => break,

            opened = await_open(&mut connecting) => {
                connecting = None;
                match opened {
                    Ok(mut opened) => {
                        if publisher.update(|state| state.mark_open()) {
                            tracing::info!("Stream for '{}' connected", name);
                            keepalive.reset();
                            channel = Some(opened);
                        } else {
                            let _ = opened.close().await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Stream for '{}' failed to open: {}", name, e);
                        publisher.update(|state| state.mark_closed());
                    }
                }
            }

            event = next_event(&mut channel), if channel.is_some() => {
                match event {
                    Some(ChannelEvent::Text(text)) => {
                        keepalive.reset();
                        match feed.decode(&text) {
                            Some(event) => {
                                publisher.update(|state| state.apply(event));
                            }
                            None => tracing::trace!("Ignoring frame on '{}'", name),
                        }
                    }
                    Some(ChannelEvent::Error(e)) => {
                        tracing::warn!("Stream for '{}' failed: {}", name, e);
                        channel = None;
                        publisher.update(|state| state.mark_closed());
                    }
                    Some(ChannelEvent::Closed) | None => {
                        tracing::info!("Stream for '{}' closed", name);
                        channel = None;
                        publisher.update(|state| state.mark_closed());
                    }
                }
            }

            Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                match joined {
                    Ok(Ok(items)) => {
                        tracing::debug!("Snapshot for '{}' returned {} items", name, items.len());
                        let now = ports.clock.now_millis();
                        publisher.update(|state| {
                            state.replace_snapshot(items, now);
                            true
                        });
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Snapshot for '{}' failed: {}", name, e);
                        publisher.update(|state| {
                            state.record_fetch_error(e.to_string());
                            true
                        });
                    }
                    Err(e) => tracing::warn!("Snapshot task for '{}' failed: {}", name, e),
                }
            }

            _ = tick(&mut refetch) => {
                tracing::debug!("Re-fetching snapshot for '{}'", name);
                spawn_fetch(&mut fetches, &ports.fetcher);
            }

            _ = keepalive.tick(), if channel.is_some() => {
                if let Some(open) = channel.as_mut()
                    && let Err(e) = open.send(KEEPALIVE_FRAME).await
                {
                    tracing::debug!("Keep-alive on '{}' failed: {}", name, e);
                }
            }
        }
    }

    fetches.abort_all();
    if let Some(mut open) = channel.take()
        && let Err(e) = open.close().await
    {
        tracing::debug!("Closing stream for '{}' failed: {}", name, e);
    }
    tracing::debug!("Subscription task for '{}' stopped", name);
}

fn spawn_fetch<T: FeedItem>(fetches: &mut FetchSet<T>, fetcher: &Arc<dyn SnapshotFetcher<T>>) {
    let fetcher = fetcher.clone();
    fetches.spawn(async move { fetcher.fetch().await });
}

/// Interval whose first tick is one period from now.
fn periodic(period: std::time::Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn await_open(
    connecting: &mut Option<OpenFuture>,
) -> Result<Box<dyn FeedChannel>, ChannelError> {
    match connecting {
        Some(open) => open.await,
        None => pending().await,
    }
}

async fn next_event(channel: &mut Option<Box<dyn FeedChannel>>) -> Option<ChannelEvent> {
    match channel {
        Some(open) => open.recv().await,
        None => pending().await,
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}
