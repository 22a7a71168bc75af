//! Ambient utilities shared by the geolive crates: logging, clocks and the
//! session context the feeds are configured from.

pub mod logger;
pub mod session;
pub mod time;
