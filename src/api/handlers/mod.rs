//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Admin insight feed: list, stats and live stream.
pub mod admin;
/// Conversation read and chat send.
pub mod chat;
/// Session lifecycle and view-state transitions.
pub mod session;
