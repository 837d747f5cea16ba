//! HTTP surface of the weather station bridge.
//!
//! Accepts PWS-protocol uploads on `/weatherstation/updateweatherstation.php`
//! and hands the decoded reading to the configured publisher.

pub mod handlers;
pub mod server;

pub use handlers::station::SUCCESS_BODY;
pub use server::{create_router, run, serve_with_shutdown, shutdown_signal, BridgeState};
