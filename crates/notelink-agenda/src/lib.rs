//! # notelink-agenda
//!
//! The agenda service: event CRUD over HTTP plus the link consumer that
//! applies note↔event link envelopes arriving on the bus.

pub mod app;
pub mod handlers;

pub use app::{app, AppState};
