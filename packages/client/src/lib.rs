//! geolive CLI client.
//!
//! - `watch`: follow one live feed and print its state on every change
//! - `draw`: drive a [`geolive_canvas::MapCanvas`] from a line-oriented prompt

pub mod console;
pub mod draw;
pub mod error;
pub mod formatter;
pub mod watch;
