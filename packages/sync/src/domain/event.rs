//! Live events pushed over a feed's stream.

/// A self-contained change to a feed's collection.
///
/// Each event can be applied without knowing which events came before it.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent<T> {
    /// One newly created item
    Item(T),
    /// Several items, newest first, prepended as a block
    Batch(Vec<T>),
    /// Remove the first item matching this probe (see [`crate::FeedItem::matches_removal`])
    Remove(T),
    /// Several events applied one after another in order
    Sequence(Vec<LiveEvent<T>>),
}
