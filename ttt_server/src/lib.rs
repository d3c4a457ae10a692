//! HTTP server for the tic-tac-toe backend.
//!
//! Wires the [`tictactoe`] managers into an axum router. The binary in
//! `main.rs` loads configuration, picks the stores and serves the router;
//! integration tests build the same router around in-memory stores.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
