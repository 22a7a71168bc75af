//! Live feed watching.
//!
//! Prints a feed's status and newest items every time its state changes.

use clap::ValueEnum;
use geolive_shared::session::Session;
use geolive_sync::{AlertsFeed, Feed, FeedState, HeatPoint, HeatmapFeed, IotFeed, SubscriptionConfig};

use crate::{
    error::ClientError,
    formatter::{DEFAULT_LIST_LIMIT, FeedFormatter},
};

/// Feed selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WatchTarget {
    Alerts,
    Iot,
    Heatmap,
}

/// Feed default configuration, with the capacity overridden when given.
pub fn config_for<F: Feed>(feed: &F, capacity: Option<usize>) -> SubscriptionConfig {
    let mut config = feed.default_config();
    if let Some(capacity) = capacity {
        config.capacity = capacity;
    }
    config
}

/// Status line followed by the heatmap summary
pub fn render_heatmap(name: &str, state: &FeedState<HeatPoint>) -> String {
    format!(
        "{}\n  {}\n",
        FeedFormatter::format_status(name, state),
        FeedFormatter::format_heatmap(state.items())
    )
}

/// Watch `target` until Ctrl+C.
pub async fn run_watch(
    session: &Session,
    target: WatchTarget,
    sensor: Option<String>,
    capacity: Option<usize>,
) -> Result<(), ClientError> {
    match target {
        WatchTarget::Alerts => {
            watch_feed(session, AlertsFeed, capacity, |name, state| {
                FeedFormatter::format_feed(name, state, DEFAULT_LIST_LIMIT, FeedFormatter::format_alert)
            })
            .await
        }
        WatchTarget::Iot => {
            watch_feed(session, IotFeed::new(sensor), capacity, |name, state| {
                FeedFormatter::format_feed(
                    name,
                    state,
                    DEFAULT_LIST_LIMIT,
                    FeedFormatter::format_reading,
                )
            })
            .await
        }
        WatchTarget::Heatmap => {
            watch_feed(session, HeatmapFeed::default(), capacity, render_heatmap).await
        }
    }
}

async fn watch_feed<F, R>(
    session: &Session,
    feed: F,
    capacity: Option<usize>,
    render: R,
) -> Result<(), ClientError>
where
    F: Feed,
    R: Fn(&str, &FeedState<F::Item>) -> String,
{
    let config = config_for(&feed, capacity);
    let subscription = geolive_sync::subscribe(session, feed, Some(config));
    let name = subscription.name();
    let mut rx = subscription.state();

    println!("Watching {} (Ctrl+C to stop)", name);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, unsubscribing from {}", name);
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    tracing::debug!("State channel of {} closed", name);
                    break;
                }
                let output = render(name, &rx.borrow_and_update());
                print!("{}", output);
            }
        }
    }

    subscription.shutdown().await;
    Ok(())
}
