//! Data Transfer Objects for the backend's wire formats.
//!
//! - `websocket`: stream envelopes and their decoding into live events
//!
//! Snapshot responses are plain JSON arrays of items and need no DTO.

pub mod websocket;
