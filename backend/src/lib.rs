//! HTTP, SSE and WebSocket service for live two-player chess
//!
//! Rules live in `chess_engine`; this crate owns accounts, the lobby, the
//! live-match registry, push delivery and result storage.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod observers;
pub mod persistence;
pub mod protocol;
pub mod session;
pub mod stats;
pub mod stream;
