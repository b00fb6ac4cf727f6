//! EMS TUI - a terminal client for streaming EMS collection insights
//!
//! This library exposes modules for use in integration tests.

pub mod auth;
pub mod binding;
pub mod client;
pub mod config;
pub mod session;
pub mod sse;
pub mod ui;
